use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, models::UserIdentity};

/// Resolves a bearer token to the user it was issued for.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Option<UserIdentity>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(auth_header: Option<&str>) -> Option<&str> {
    let auth_str = auth_header?.trim();
    let (scheme, token) = auth_str.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// HS256 JWT verification against a shared secret.
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, token: &str) -> Option<UserIdentity> {
        let decoded = match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::debug!(error = %err, "rejected bearer token");
                return None;
            }
        };

        let user_id = match Uuid::parse_str(&decoded.claims.sub) {
            Ok(id) => id,
            Err(_) => {
                tracing::debug!(sub = %decoded.claims.sub, "token subject is not a user id");
                return None;
            }
        };

        Some(UserIdentity {
            user_id,
            role: decoded.claims.role,
        })
    }
}
