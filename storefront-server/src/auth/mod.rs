//! Authentication Module
//!
//! JWT-based authentication: token service, password hashing, axum
//! middleware and the [`CurrentUser`] extractor.

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
pub use password::{hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// Authenticated user injected into request extensions by the auth
/// middleware (or the extractor)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| format!("Non-numeric subject '{}'", claims.sub))?;
        Ok(Self {
            id,
            name: claims.name,
            email: claims.email,
            is_admin: claims.is_admin,
        })
    }
}
