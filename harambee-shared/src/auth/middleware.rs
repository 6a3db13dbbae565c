/// Authentication context for Axum requests
///
/// The API's JWT middleware validates the Bearer token, resolves the user
/// (rejecting blocked accounts), and inserts an `AuthContext` into request
/// extensions. Handlers extract it with Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use harambee_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::user::UserRole;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email address from the token
    pub email: String,

    /// Site-wide role
    pub role: UserRole,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            role: claims.role,
        }
    }

    /// Checks whether the user holds the site-wide admin role
    pub fn is_site_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Error type for authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("Invalid authorization format: {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Account has been blocked by an administrator
    #[error("Account is blocked")]
    AccountBlocked,

    /// Database error while resolving the user
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AuthError::InvalidFormat(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AuthError::AccountBlocked => (StatusCode::FORBIDDEN, "forbidden"),
            AuthError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(serde_json::json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;

    #[test]
    fn test_auth_context_from_claims() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "admin@harambee.org".into(),
            UserRole::Admin,
            TokenType::Access,
        );

        let ctx = AuthContext::from_claims(&claims);
        assert_eq!(ctx.user_id, claims.sub);
        assert_eq!(ctx.email, "admin@harambee.org");
        assert!(ctx.is_site_admin());
    }

    #[test]
    fn test_regular_user_is_not_site_admin() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "member@harambee.org".into(),
            UserRole::User,
            TokenType::Access,
        );

        assert!(!AuthContext::from_claims(&claims).is_site_admin());
    }
}
