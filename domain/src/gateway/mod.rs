//! Clients for the services that sit behind this backend.

pub mod downstream;

pub use downstream::{Service, ServiceClient, DEFAULT_TENANT_ID, TENANT_HEADER};
