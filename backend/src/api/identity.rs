//! Request-identity plumbing: session user and guest device cookie.
//!
//! Handlers translate the session and the device cookie into an explicit
//! [`Actor`] before calling services; nothing below the API layer reads
//! ambient request state.

use actix_session::Session;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use uuid::Uuid;

use crate::domain::{Actor, Error, UserId};

/// Session key carrying the authenticated user id.
pub const SESSION_USER_KEY: &str = "user_id";

/// Cookie carrying the opaque guest device identifier.
pub const DEVICE_COOKIE: &str = "device_id";

/// Device cookie lifetime: one year.
const DEVICE_COOKIE_DAYS: i64 = 365;

/// Read the authenticated user id from the session, if any.
pub fn session_user_id(session: &Session) -> Result<Option<UserId>, Error> {
    let raw: Option<Uuid> = session
        .get(SESSION_USER_KEY)
        .map_err(|err| Error::internal(format!("session read failed: {err}")))?;
    Ok(raw.map(UserId::from_uuid))
}

/// Store the authenticated user id in the session.
pub fn log_in(session: &Session, user_id: &UserId) -> Result<(), Error> {
    session
        .insert(SESSION_USER_KEY, user_id.as_uuid())
        .map_err(|err| Error::internal(format!("session write failed: {err}")))
}

/// Drop the session identity.
pub fn log_out(session: &Session) {
    session.purge();
}

/// The raw device id from the request, if the cookie is present.
pub fn device_id(req: &HttpRequest) -> Option<String> {
    req.cookie(DEVICE_COOKIE).map(|c| c.value().to_owned())
}

/// The actor this request acts as: session user first, device second.
pub fn current_actor(session: &Session, req: &HttpRequest) -> Result<Actor, Error> {
    if let Some(user_id) = session_user_id(session)? {
        return Ok(Actor::User(user_id));
    }
    Ok(device_id(req).map_or(Actor::Anonymous, Actor::Device))
}

/// The device id to use for a write flow, plus a cookie to set when the
/// request did not carry one yet.
pub fn ensure_device_id(req: &HttpRequest) -> (String, Option<Cookie<'static>>) {
    if let Some(existing) = device_id(req) {
        return (existing, None);
    }
    let fresh = Uuid::new_v4().to_string();
    let cookie = Cookie::build(DEVICE_COOKIE, fresh.clone())
        .path("/")
        .max_age(Duration::days(DEVICE_COOKIE_DAYS))
        .same_site(SameSite::Lax)
        .http_only(true)
        .finish();
    (fresh, Some(cookie))
}

/// Require an authenticated session, failing with `unauthorized` otherwise.
pub fn require_session_user(session: &Session) -> Result<UserId, Error> {
    session_user_id(session)?.ok_or_else(|| Error::unauthorized("authentication required"))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[rstest]
    fn missing_cookie_yields_a_fresh_device_id() {
        let req = TestRequest::default().to_http_request();
        let (id, cookie) = ensure_device_id(&req);
        let issued = cookie.expect("cookie issued");
        assert_eq!(issued.value(), id);
        assert_eq!(issued.name(), DEVICE_COOKIE);
        assert_eq!(issued.same_site(), Some(SameSite::Lax));
    }

    #[rstest]
    fn existing_cookie_is_reused_without_reissue() {
        let req = TestRequest::default()
            .cookie(Cookie::new(DEVICE_COOKIE, "device-7"))
            .to_http_request();
        let (id, cookie) = ensure_device_id(&req);
        assert_eq!(id, "device-7");
        assert!(cookie.is_none());
    }

    #[rstest]
    fn device_id_reads_the_cookie_value() {
        let req = TestRequest::default()
            .cookie(Cookie::new(DEVICE_COOKIE, "device-9"))
            .to_http_request();
        assert_eq!(device_id(&req).as_deref(), Some("device-9"));
    }
}
