use crate::error::Error;
use crate::extractors::AuthenticatedSession;
use crate::AppState;
use axum::extract::{RawQuery, State};
use axum::Json;
use domain::reservation;
use serde_json::Value;

/// GET a GraphQL query, passing the query string through to the reservation service.
pub(crate) async fn query(
    State(app_state): State<AppState>,
    session: AuthenticatedSession,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Value>, Error> {
    let result = reservation::query(
        &app_state.reservation_service,
        raw_query.as_deref(),
        &session.access_token,
    )
    .await?;
    Ok(Json(result))
}

/// POST a GraphQL document to the reservation service.
pub(crate) async fn graphql(
    State(app_state): State<AppState>,
    session: AuthenticatedSession,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Error> {
    let result = reservation::forward_graphql(
        &app_state.reservation_service,
        &body,
        &session.access_token,
    )
    .await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use crate::router::define_routes;
    use crate::test_support::{test_state, token_expiring_in, FakeIdentityProvider};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use mockito::Matcher;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_get_is_rejected_without_downstream_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let app = define_routes(test_state(
            Arc::new(FakeIdentityProvider::default()),
            &server.url(),
        ));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/_internal/reservation-proxy?query=%7B%20reservations%20%7D")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_authenticated_post_forwards_body_with_bearer_and_tenant() {
        let mut server = mockito::Server::new_async().await;
        let token = token_expiring_in(600);
        let body = json!({"query": "mutation { reserve(spotId: 1) { id } }"});
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", format!("Bearer {token}").as_str())
            .match_header("x-tenant-id", "parkora")
            .match_body(Matcher::Json(body.clone()))
            .with_status(200)
            .with_body(r#"{"data":{"reserve":{"id":"r1"}}}"#)
            .create_async()
            .await;
        let app = define_routes(test_state(
            Arc::new(FakeIdentityProvider::default()),
            &server.url(),
        ));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/_internal/reservation-proxy")
                    .header(header::COOKIE, format!("access_token={token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"data": {"reserve": {"id": "r1"}}})
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_service_is_503() {
        let token = token_expiring_in(600);
        let app = define_routes(test_state(
            Arc::new(FakeIdentityProvider::default()),
            "http://127.0.0.1:9",
        ));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/_internal/reservation-proxy?query=x")
                    .header(header::COOKIE, format!("access_token={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Failed to connect to reservation-service"})
        );
    }
}
