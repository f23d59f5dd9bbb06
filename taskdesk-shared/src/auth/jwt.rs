/// JWT token generation and validation
///
/// Tokens are signed with HS256 and carry the user's identity plus the
/// role every authorization decision keys off, so resource handlers never
/// need a user fetch just to build an [`crate::auth::authorization::Actor`].
///
/// # Token Types
///
/// - **Access**: 24 hours, sent as the bearer token on every request
/// - **Refresh**: 30 days, exchanged for fresh access tokens
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
/// use taskdesk_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new(
///     Uuid::new_v4(),
///     "Ada".to_string(),
///     "ada@example.com".to_string(),
///     UserRole::User,
///     TokenType::Access,
/// );
/// let secret = "a-secret-that-is-at-least-32-bytes!!";
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_access_token(&token, secret)?;
/// assert_eq!(validated.sub, claims.sub);
/// assert_eq!(validated.role, UserRole::User);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Issuer claim stamped into and required of every token
const ISSUER: &str = "taskdesk";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// A token of the wrong type was presented (e.g. a refresh token used
    /// as a bearer token)
    #[error("Expected {expected} token, got {actual}")]
    WrongTokenType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived bearer token
    Access,

    /// Long-lived token exchanged for new access tokens
    Refresh,
}

impl TokenType {
    /// Default expiration for this token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }

    /// Token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the profile
/// fields the frontend displays and the role the policy core consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issuer - always "taskdesk"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Display name (custom claim)
    pub name: String,

    /// Email address (custom claim)
    pub email: String,

    /// Account role (custom claim); verified by the signature, so it can
    /// feed authorization decisions directly
    pub role: UserRole,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims with the default expiration for `token_type`
    pub fn new(
        user_id: Uuid,
        name: String,
        email: String,
        role: UserRole,
        token_type: TokenType,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + token_type.default_expiration();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            name,
            email,
            role,
            token_type,
        }
    }
}

/// Signs a token for the given claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Validates a token's signature, expiration, and issuer
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens and
/// `JwtError::ValidationError` for any other validation failure.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_nbf = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Validates a token and requires it to be an access token
///
/// # Errors
///
/// Returns `JwtError::WrongTokenType` if a refresh token was presented.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::WrongTokenType {
            expected: TokenType::Access.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Exchanges a valid refresh token for a new access token
///
/// The new token carries the same identity and role as the refresh token.
///
/// # Errors
///
/// Returns `JwtError::WrongTokenType` if an access token was presented,
/// or any validation error of the underlying token.
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, JwtError> {
    let claims = validate_token(refresh_token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::WrongTokenType {
            expected: TokenType::Refresh.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    let access_claims = Claims::new(
        claims.sub,
        claims.name,
        claims.email,
        claims.role,
        TokenType::Access,
    );

    create_token(&access_claims, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-of-at-least-32-bytes";

    fn access_claims(role: UserRole) -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "Test".to_string(),
            "test@example.com".to_string(),
            role,
            TokenType::Access,
        )
    }

    #[test]
    fn test_create_and_validate_roundtrip() {
        let claims = access_claims(UserRole::User);
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.sub, claims.sub);
        assert_eq!(validated.email, "test@example.com");
        assert_eq!(validated.role, UserRole::User);
        assert_eq!(validated.iss, "taskdesk");
    }

    #[test]
    fn test_role_claim_survives_roundtrip() {
        let claims = access_claims(UserRole::Admin);
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(validated.role, UserRole::Admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(&access_claims(UserRole::User), SECRET).unwrap();

        let result = validate_token(&token, "another-secret-also-32-bytes-long!!");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_refresh_token_rejected_as_bearer() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "Test".to_string(),
            "test@example.com".to_string(),
            UserRole::User,
            TokenType::Refresh,
        );
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_access_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::WrongTokenType { .. })));
    }

    #[test]
    fn test_refresh_access_token_issues_access() {
        let refresh = Claims::new(
            Uuid::new_v4(),
            "Test".to_string(),
            "test@example.com".to_string(),
            UserRole::Admin,
            TokenType::Refresh,
        );
        let refresh_token = create_token(&refresh, SECRET).unwrap();

        let access_token = refresh_access_token(&refresh_token, SECRET).unwrap();
        let claims = validate_access_token(&access_token, SECRET).unwrap();

        assert_eq!(claims.sub, refresh.sub);
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_access_token_cannot_refresh() {
        let token = create_token(&access_claims(UserRole::User), SECRET).unwrap();

        let result = refresh_access_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::WrongTokenType { .. })));
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut claims = access_claims(UserRole::User);
        claims.iat -= 3600;
        claims.nbf -= 3600;
        claims.exp = Utc::now().timestamp() - 120;

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token("not.a.token", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }
}
