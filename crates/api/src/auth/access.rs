//! Capability guard
//!
//! Each handler declares the access rule it needs through a [`Granted`]
//! extractor. The rule is checked before the handler body runs, against the
//! grants of the authenticated [`AuthUser`] on the section's resource tag.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use backoffice_shared::Capability;

use super::middleware::AuthUser;
use crate::error::ApiError;

/// Resource tag identifying the admin section being protected
#[derive(Debug, Clone)]
pub struct ResourceTag(pub Arc<str>);

impl ResourceTag {
    pub fn new(tag: &str) -> Self {
        Self(Arc::from(tag))
    }
}

/// Declarative access requirement for a handler
pub trait AccessRule: Send + Sync + 'static {
    /// Every capability listed must be granted
    const CAPABILITIES: &'static [Capability];
    /// Appended to the resource tag to form the permission key
    const TAG_SUFFIX: &'static str = "";
    const DENIED_MESSAGE: &'static str = "Access denied.";

    fn resource(tag: &ResourceTag) -> String {
        format!("{}{}", tag.0, Self::TAG_SUFFIX)
    }
}

/// Proof that the caller satisfies rule `R`
pub struct Granted<R> {
    pub user: AuthUser,
    _rule: PhantomData<fn() -> R>,
}

#[async_trait]
impl<S, R> FromRequestParts<S> for Granted<R>
where
    S: Send + Sync,
    R: AccessRule,
    ResourceTag: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)?;

        let resource = R::resource(&ResourceTag::from_ref(state));
        if !user.is_granted(R::CAPABILITIES, &resource) {
            tracing::warn!(
                employee_id = user.employee_id,
                resource = %resource,
                required = ?R::CAPABILITIES,
                "Access denied"
            );
            return Err(ApiError::Forbidden(R::DENIED_MESSAGE.to_string()));
        }

        Ok(Self {
            user,
            _rule: PhantomData,
        })
    }
}
