//! Operator token signing and validation.
//!
//! Operator tokens are HS256-signed JWTs issued by the account service with a
//! [`Claims`] payload. This service only validates them; [`generate_token`]
//! mirrors the issuer so tooling and tests can mint compatible tokens.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AdminConfig;

/// Seconds in one day of token lifetime.
const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// JWT claims embedded in every operator token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The operator's user id.
    #[serde(rename = "UserID")]
    pub user_id: String,
    /// Client platform the token was issued for.
    #[serde(rename = "PlatformID")]
    pub platform_id: i32,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Sign a token for `user_id` valid for `tokenPolicy.expire` days.
pub fn generate_token(
    user_id: &str,
    platform_id: i32,
    config: &AdminConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = chrono::Utc::now().timestamp() + config.token_policy.expire * SECS_PER_DAY;

    let claims = Claims {
        user_id: user_id.to_string(),
        platform_id,
        exp,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode a token, returning the embedded [`Claims`].
///
/// Checks the signature and expiration.
pub fn validate_token(
    token: &str,
    config: &AdminConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenPolicy;

    fn test_config() -> AdminConfig {
        AdminConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            token_policy: TokenPolicy { expire: 1 },
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let config = test_config();
        let token = generate_token("admin-1", 5, &config).unwrap();

        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.user_id, "admin-1");
        assert_eq!(claims.platform_id, 5);
        assert!(claims.exp > chrono::Utc::now().timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token("admin-1", 1, &test_config()).unwrap();
        let other = AdminConfig {
            secret: "a-completely-different-secret-value".to_string(),
            ..test_config()
        };
        assert!(validate_token(&token, &other).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = AdminConfig {
            token_policy: TokenPolicy { expire: -1 },
            ..test_config()
        };
        let token = generate_token("admin-1", 1, &config).unwrap();
        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn test_claims_use_issuer_field_names() {
        let claims = Claims {
            user_id: "u".into(),
            platform_id: 2,
            exp: 0,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["UserID"], "u");
        assert_eq!(json["PlatformID"], 2);
    }
}
