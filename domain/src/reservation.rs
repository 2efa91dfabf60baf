use crate::error::Error;
use crate::gateway::ServiceClient;
use serde_json::Value;

/// Forwards a GraphQL query string from a GET request.
pub async fn query(
    client: &ServiceClient,
    raw_query: Option<&str>,
    bearer: &str,
) -> Result<Value, Error> {
    client.get_graphql(raw_query, Some(bearer)).await
}

/// Forwards a GraphQL document from a POST request.
pub async fn forward_graphql(
    client: &ServiceClient,
    body: &Value,
    bearer: &str,
) -> Result<Value, Error> {
    client.post_graphql(body, Some(bearer)).await
}
