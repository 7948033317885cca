use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use crate::error::{AppError, AppResult};

pub const VERIFIED_USER_COOKIE: &str = "verified_user";

/// The verified session principal, if any. Populated from the
/// `verified_user` cookie set by the login flow.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Principal(pub Option<i32>);

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user_id =
            jar.get(VERIFIED_USER_COOKIE).and_then(|cookie| cookie.value().trim().parse().ok());
        Ok(Principal(user_id))
    }
}

/// Any verified user, for catalog writes not tied to one account.
pub fn authenticated(principal: Principal) -> AppResult<i32> {
    principal.0.ok_or(AppError::Unauthenticated)
}

/// Only the owning user may read or write their nominations.
pub fn authorize(principal: Principal, user_id: i32) -> AppResult<()> {
    match principal.0 {
        None => Err(AppError::Unauthenticated),
        Some(id) if id == user_id => Ok(()),
        Some(_) => Err(AppError::forbidden("Forbidden")),
    }
}
