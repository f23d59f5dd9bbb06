/// Authentication middleware for Axum
///
/// Validates the `Authorization: Bearer <token>` header, builds the
/// [`Actor`] the policy core works with from the verified claims, and
/// inserts it into request extensions. Handlers extract it with
/// `Extension<Actor>`.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware, middleware::Next, routing::get, Extension, Router};
/// use taskdesk_shared::auth::authorization::Actor;
/// use taskdesk_shared::auth::middleware::require_auth;
///
/// async fn whoami(Extension(actor): Extension<Actor>) -> String {
///     format!("user {} ({})", actor.id, actor.role.as_str())
/// }
///
/// let secret = "a-secret-that-is-at-least-32-bytes!!".to_string();
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(move |req: Request, next: Next| {
///         require_auth(secret.clone(), req, next)
///     }));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::authorization::Actor;
use super::jwt::{validate_access_token, JwtError};

/// Error type for the authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Authorization header is not a Bearer token
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Authenticated, but the admin role is required
    AdminRequired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::AdminRequired => {
                (StatusCode::FORBIDDEN, "Administrator access required").into_response()
            }
        }
    }
}

/// Bearer-token authentication middleware
///
/// On success the request gains an [`Actor`] extension carrying the user
/// id and role from the verified claims.
///
/// # Errors
///
/// - 401 when the header is missing, the token is invalid or expired, or a
///   refresh token is presented as a bearer token
/// - 400 when the header is not in `Bearer <token>` form
pub async fn require_auth(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::WrongTokenType { .. } => {
            AuthError::InvalidToken("Refresh tokens cannot be used as bearer tokens".to_string())
        }
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    req.extensions_mut()
        .insert(Actor::new(claims.sub, claims.role));

    Ok(next.run(req).await)
}

/// Admin-gating middleware
///
/// Must run after [`require_auth`]; rejects any actor without the admin
/// role. A request that somehow reaches this layer unauthenticated is
/// rejected with 401.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let actor = req
        .extensions()
        .get::<Actor>()
        .copied()
        .ok_or(AuthError::MissingCredentials)?;

    if !actor.is_admin() {
        return Err(AuthError::AdminRequired);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_codes() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidFormat("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AuthError::InvalidToken("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::AdminRequired.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
