/// Authentication service - JWT issuing and verification
use crate::error::{Result, ServerError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tattmap_core::types::{Role, User, UserId};

/// Upper bound for token lifetime
const MAX_EXPIRATION_DAYS: i64 = 3650;

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration: Duration,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// Token payload; `sub` is the user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub.clone())
    }
}

impl AuthService {
    pub fn new(secret: &str, expiration_days: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration: Duration::days(
                i64::try_from(expiration_days)
                    .unwrap_or(MAX_EXPIRATION_DAYS)
                    .min(MAX_EXPIRATION_DAYS),
            ),
        }
    }

    /// Token lifetime, also used as the cookie max-age
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Create an access token for a user
    pub fn create_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let exp = now + self.expiration;

        let claims = Claims {
            sub: user.id.as_str().to_string(),
            role: user.role,
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(ServerError::from)
    }

    /// Verify and decode a token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(token_data.claims)
    }
}
