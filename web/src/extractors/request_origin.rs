use crate::error::Error;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header::HOST, request::Parts},
};

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";

/// The application's public origin (`scheme://host[:port]`, no trailing slash).
///
/// Taken from configuration when set, otherwise from the forwarding headers the
/// ingress adds, falling back to the `Host` header.
pub(crate) struct RequestOrigin(pub String);

impl FromRequestParts<AppState> for RequestOrigin {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(origin) = app_state.config.public_origin() {
            return Ok(RequestOrigin(origin.to_string()));
        }

        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let host = header(FORWARDED_HOST)
            .or_else(|| header(HOST.as_str()))
            .ok_or_else(|| Error::input("Missing Host header"))?;
        let scheme = header(FORWARDED_PROTO).unwrap_or("http");

        Ok(RequestOrigin(format!("{scheme}://{host}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_state, FakeIdentityProvider};
    use axum::http::Request;
    use service::config::Config;
    use std::sync::Arc;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/auth/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_configured_origin_wins() {
        let state = test_state(Arc::new(FakeIdentityProvider::default()), "http://unused");
        let mut parts = parts(&[("host", "internal:4000")]);

        let RequestOrigin(origin) = RequestOrigin::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(origin, "https://app.parkora.test");
    }

    #[tokio::test]
    async fn test_origin_from_forwarded_headers() {
        let state = test_state(Arc::new(FakeIdentityProvider::default()), "http://unused");
        let state = AppState {
            config: Config::from_args(["parkora_bff"]),
            ..state
        };
        let mut parts = parts(&[
            ("host", "internal:4000"),
            ("x-forwarded-proto", "https"),
            ("x-forwarded-host", "parkora.crn.si"),
        ]);

        let RequestOrigin(origin) = RequestOrigin::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(origin, "https://parkora.crn.si");

        let mut parts = self::parts(&[("host", "localhost:4000")]);
        let RequestOrigin(origin) = RequestOrigin::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(origin, "http://localhost:4000");
    }
}
