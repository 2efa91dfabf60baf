use crate::error::Error;
use crate::extractors::AuthenticatedSession;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use domain::user;
use serde_json::Value;

/// POST a GraphQL document to the user service.
pub(crate) async fn graphql(
    State(app_state): State<AppState>,
    session: AuthenticatedSession,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Error> {
    let result = user::forward_graphql(&app_state.user_service, &body, &session.access_token).await?;
    Ok(Json(result))
}
