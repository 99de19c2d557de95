//! JWT token handling

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use std::time::{SystemTime, UNIX_EPOCH};

use super::models::Claims;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    secret: String,
    expiration_hours: u64,
}

impl JwtConfig {
    pub fn new(secret: String, expiration_hours: u64) -> Self {
        Self {
            secret,
            expiration_hours,
        }
    }

    /// `JWT_SECRET` and `JWT_EXPIRATION_HOURS` from the environment. The
    /// fallback secret keeps the service operational without configuration;
    /// deployments are expected to set a real one.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string());
        let expiration_hours = std::env::var("JWT_EXPIRATION_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);
        Self::new(secret, expiration_hours)
    }
}

/// Stateless token issue/verify. No server-side session state and no
/// revocation: a token stays valid until its expiry.
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Create a new JWT token for a user
    pub fn create_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_secs() as usize;

        let expiration = now + (self.config.expiration_hours as usize * 3600);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: expiration,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
    }

    /// Verify and decode a JWT token. Signature mismatch, malformed input
    /// and passed expiry all come back as `Err`.
    pub fn verify_token(
        &self,
        token: &str,
    ) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &Validation::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify_token() {
        let config = JwtConfig::new("test-secret".to_string(), 24);
        let manager = JwtManager::new(config);

        let token = manager.create_token("user_123", "test@example.com").unwrap();

        let verified = manager.verify_token(&token).unwrap();
        assert_eq!(verified.claims.sub, "user_123");
        assert_eq!(verified.claims.email, "test@example.com");
        assert!(verified.claims.exp > verified.claims.iat);
    }

    #[test]
    fn test_invalid_token() {
        let config = JwtConfig::new("test-secret".to_string(), 24);
        let manager = JwtManager::new(config);

        let result = manager.verify_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new(JwtConfig::new("secret-a".to_string(), 24));
        let verifier = JwtManager::new(JwtConfig::new("secret-b".to_string(), 24));

        let token = issuer.create_token("user_123", "test@example.com").unwrap();
        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = "test-secret";
        let manager = JwtManager::new(JwtConfig::new(secret.to_string(), 24));

        // Forge a token whose expiry is well past the default leeway.
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize;
        let claims = Claims {
            sub: "user_123".to_string(),
            email: "test@example.com".to_string(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let result = manager.verify_token(&token);
        assert!(result.is_err());
    }
}
