use crate::error::Error;
use crate::extractors::{AuthenticatedSession, CurrentSession};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use domain::parking::{self, ParkingAvailability};
use serde_json::Value;

/// GET current availability per parking location. Public; the caller's token is
/// forwarded when there is one.
pub(crate) async fn availability(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ParkingAvailability>, Error> {
    let availability =
        parking::current_availability(&app_state.parking_service, session.bearer_token()).await?;
    Ok(Json(availability))
}

/// POST a GraphQL document to the parking service.
pub(crate) async fn graphql(
    State(app_state): State<AppState>,
    session: AuthenticatedSession,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Error> {
    let result =
        parking::forward_graphql(&app_state.parking_service, &body, Some(&session.access_token))
            .await?;
    Ok(Json(result))
}
