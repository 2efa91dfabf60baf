//! Keeps the user service's directory in step with the identity provider.

use crate::error::Error;
use crate::gateway::ServiceClient;
use log::*;
use oidc_auth::{decode_claims, Claims};
use serde_json::{json, Value};

const USER_BY_KEYCLOAK_ID: &str = "\
query UserByKeycloakId($keycloakUserId: String!) {
  userByKeycloakId(keycloakUserId: $keycloakUserId) {
    id
  }
}";

const CREATE_USER: &str = "\
mutation CreateUser($email: String!, $firstName: String!, $lastName: String!, $keycloakUserId: String!) {
  createUser(email: $email, firstName: $firstName, lastName: $lastName, keycloakUserId: $keycloakUserId) {
    id
    email
  }
}";

#[derive(Debug, Clone, PartialEq)]
pub enum Provisioning {
    Existing,
    Created,
}

/// Profile fields sent when creating a directory entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub keycloak_user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Claims> for NewUser {
    fn from(claims: &Claims) -> Self {
        let mut words = claims.name.as_deref().unwrap_or_default().split_whitespace();
        let first_from_name = words.next().unwrap_or_default().to_string();
        let last_from_name = words.collect::<Vec<_>>().join(" ");

        NewUser {
            keycloak_user_id: claims.sub.clone(),
            email: claims.email.clone().unwrap_or_default(),
            first_name: claims.given_name.clone().unwrap_or(first_from_name),
            last_name: claims.family_name.clone().unwrap_or(last_from_name),
        }
    }
}

/// Forwards a GraphQL document to the user service unchanged.
pub async fn forward_graphql(
    client: &ServiceClient,
    body: &Value,
    bearer: &str,
) -> Result<Value, Error> {
    client.post_graphql(body, Some(bearer)).await
}

/// Creates the directory entry for the ID token's subject unless one exists.
///
/// A failed lookup is treated as "not found" so that creation is still attempted.
pub async fn ensure_exists(
    client: &ServiceClient,
    id_token: &str,
    access_token: &str,
) -> Result<Provisioning, Error> {
    let claims = decode_claims(id_token)?;
    let new_user = NewUser::from(&claims);

    let lookup = json!({
        "query": USER_BY_KEYCLOAK_ID,
        "variables": { "keycloakUserId": new_user.keycloak_user_id },
    });
    match client.post_graphql(&lookup, Some(access_token)).await {
        Ok(result) if !result["data"]["userByKeycloakId"].is_null() => {
            debug!("User {} already provisioned", new_user.keycloak_user_id);
            return Ok(Provisioning::Existing);
        }
        Ok(_) => {}
        Err(e) => warn!("User lookup failed, attempting creation anyway: {e}"),
    }

    let create = json!({
        "query": CREATE_USER,
        "variables": {
            "email": new_user.email,
            "firstName": new_user.first_name,
            "lastName": new_user.last_name,
            "keycloakUserId": new_user.keycloak_user_id,
        },
    });
    let result = client.post_graphql(&create, Some(access_token)).await?;
    info!(
        "Created user {} (id {})",
        new_user.keycloak_user_id, result["data"]["createUser"]["id"]
    );

    Ok(Provisioning::Created)
}
