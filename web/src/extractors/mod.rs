pub(crate) mod authenticated_session;
pub(crate) mod request_origin;

pub(crate) use authenticated_session::{AuthenticatedSession, CurrentSession};
pub(crate) use request_origin::RequestOrigin;
