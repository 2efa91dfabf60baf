use crate::controller::auth_controller::begin_authorization;
use crate::error::Error;
use crate::extractors::RequestOrigin;
use crate::AppState;
use axum::extract::State;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use oidc_auth::Prompt;

/// GET starts the same flow as login, asking the identity provider for its
/// account creation form.
pub(crate) async fn register(
    State(app_state): State<AppState>,
    RequestOrigin(origin): RequestOrigin,
    jar: CookieJar,
) -> Result<(CookieJar, Response), Error> {
    begin_authorization(&app_state, &origin, jar, Some(Prompt::Create)).await
}
