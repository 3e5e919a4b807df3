//! JWT token handling.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use podium_common::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Tournament role
    pub role: Role,
    /// Division the user belongs to (admins have none)
    pub division_id: Option<Uuid>,
    /// Room, table, or category the role is bound to
    pub association: Option<Uuid>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type
    pub token_type: String,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_expiration: i64,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, access_expiration: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_expiration,
        }
    }

    /// Generate an access token
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        role: Role,
        division_id: Option<Uuid>,
        association: Option<Uuid>,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_expiration);

        let claims = AccessTokenClaims {
            sub: user_id,
            role,
            division_id,
            association,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: "access".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Token(e.to_string()))
    }

    /// Verify and decode an access token
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, ApiError> {
        let token_data: TokenData<AccessTokenClaims> =
            decode(token, &self.decoding_key, &Validation::default())
                .map_err(|e| ApiError::Token(e.to_string()))?;

        if token_data.claims.token_type != "access" {
            return Err(ApiError::Token("Invalid token type".to_string()));
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_claims() {
        let manager = JwtManager::new("test-secret", 900);
        let user_id = Uuid::new_v4();
        let division_id = Uuid::new_v4();

        let token = manager
            .generate_access_token(user_id, Role::Referee, Some(division_id), None)
            .unwrap();
        let claims = manager.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Referee);
        assert_eq!(claims.division_id, Some(division_id));
        assert_eq!(claims.association, None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let manager = JwtManager::new("test-secret", 900);
        let token = manager
            .generate_access_token(Uuid::new_v4(), Role::Admin, None, None)
            .unwrap();

        let other = JwtManager::new("other-secret", 900);
        assert!(other.verify_access_token(&token).is_err());
    }
}
