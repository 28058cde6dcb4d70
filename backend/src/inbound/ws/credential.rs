//! Credential extraction from the upgrade request.
//!
//! Sources, first match wins: `Authorization: Bearer <token>`, the `token`
//! query parameter, then the `token` cookie set by the auth service.

use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;
use url::form_urlencoded;

use crate::domain::Credential;

const TOKEN_PARAM: &str = "token";

/// Pull the bearer credential from the request, if any source carries one.
pub fn extract_credential(req: &HttpRequest) -> Option<Credential> {
    from_authorization(req)
        .or_else(|| from_query(req))
        .or_else(|| from_cookie(req))
}

fn from_authorization(req: &HttpRequest) -> Option<Credential> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Credential::new(token)
}

fn from_query(req: &HttpRequest) -> Option<Credential> {
    form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == TOKEN_PARAM)
        .and_then(|(_, value)| Credential::new(value))
}

fn from_cookie(req: &HttpRequest) -> Option<Credential> {
    req.cookie(TOKEN_PARAM)
        .and_then(|cookie| Credential::new(cookie.value()))
}
