//! Business rules of the Parkora backend-for-frontend.
//!
//! `web` depends on this crate for session decisions, downstream calls and error
//! kinds, and never reaches into `oidc-auth` error internals directly.

pub mod error;
pub mod gateway;
pub mod parking;
pub mod reservation;
pub mod session;
pub mod user;

pub use gateway::{Service, ServiceClient};
pub use session::{SessionContext, SessionUser, TokenStatus};
