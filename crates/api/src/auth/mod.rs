//! Authentication and authorization for the back office

pub mod access;
pub mod jwt;
pub mod middleware;

pub use access::{AccessRule, Granted, ResourceTag};
pub use jwt::{Claims, Grants, JwtError, JwtManager};
pub use middleware::{cookie_value, require_auth, AuthUser, TOKEN_COOKIE};
