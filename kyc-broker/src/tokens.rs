//! JWT access/refresh token issuance

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::BrokerError;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: u64,
    pub login_key: String,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

/// An issued access/refresh pair
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// HS256 token issuer
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn issue_pair(&self, account_id: u64, login_key: &str) -> Result<TokenPair, BrokerError> {
        Ok(TokenPair {
            access_token: self.issue(account_id, login_key, TOKEN_TYPE_ACCESS)?,
            refresh_token: self.issue(account_id, login_key, TOKEN_TYPE_REFRESH)?,
            expires_in: self.access_ttl_secs,
        })
    }

    fn issue(
        &self,
        account_id: u64,
        login_key: &str,
        token_type: &str,
    ) -> Result<String, BrokerError> {
        let now = Utc::now().timestamp();
        let ttl = if token_type == TOKEN_TYPE_REFRESH {
            self.refresh_ttl_secs
        } else {
            self.access_ttl_secs
        };
        let claims = Claims {
            sub: account_id,
            login_key: login_key.to_string(),
            token_type: token_type.to_string(),
            iat: now,
            exp: now + ttl,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| BrokerError::Internal(e.to_string()))
    }

    /// Decode and validate a token, requiring the expected type.
    /// Failures map to the generic auth error.
    pub fn verify(&self, token: &str, expected_type: &str) -> Result<Claims, BrokerError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| BrokerError::AuthFailed)?;
        if data.claims.token_type != expected_type {
            return Err(BrokerError::AuthFailed);
        }
        Ok(data.claims)
    }
}
