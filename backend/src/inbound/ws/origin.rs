//! Origin allow-list for WebSocket upgrades.

use std::collections::HashSet;

use actix_web::http::header::{HeaderMap, ORIGIN};
use tracing::{error, warn};
use url::Url;

/// Normalised origins permitted to open a relay connection.
///
/// An empty list accepts every request, including ones without an `Origin`
/// header (native clients).
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins {
    origins: HashSet<String>,
}

impl AllowedOrigins {
    /// Accept any origin.
    pub fn any() -> Self {
        Self::default()
    }

    /// Accept only the given origins, already normalised to
    /// `scheme://host[:port]`.
    pub fn new(origins: impl IntoIterator<Item = String>) -> Self {
        Self {
            origins: origins.into_iter().collect(),
        }
    }

    /// Whether the allow-list is open.
    pub fn is_open(&self) -> bool {
        self.origins.is_empty()
    }

    /// Check the request's `Origin` header against the allow-list.
    pub(crate) fn validate(&self, headers: &HeaderMap) -> actix_web::Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let mut origin_iter = headers.get_all(ORIGIN);
        let origin_header = origin_iter.next().ok_or_else(|| {
            error!("Missing Origin header on WebSocket upgrade");
            actix_web::error::ErrorForbidden("Origin not allowed")
        })?;
        if origin_iter.next().is_some() {
            error!("Multiple Origin headers on WebSocket upgrade");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }

        let origin_value = origin_header.to_str().map_err(|error| {
            error!(error = %error, "Failed to parse Origin header as string");
            actix_web::error::ErrorBadRequest("Invalid Origin header")
        })?;
        let origin = Url::parse(origin_value).map_err(|error| {
            error!(error = %error, "Failed to parse Origin header as URL");
            actix_web::error::ErrorBadRequest("Invalid Origin header")
        })?;

        if self.origins.contains(&origin.origin().ascii_serialization()) {
            Ok(())
        } else {
            warn!(
                origin = origin_value,
                "Rejected WS upgrade due to disallowed Origin"
            );
            Err(actix_web::error::ErrorForbidden("Origin not allowed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::http::header::HeaderValue;
    use rstest::{fixture, rstest};

    #[fixture]
    fn allow_list() -> AllowedOrigins {
        AllowedOrigins::new([
            "http://localhost:5173".to_owned(),
            "https://shop.example".to_owned(),
        ])
    }

    fn headers(values: &[HeaderValue]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for value in values {
            map.append(ORIGIN, value.clone());
        }
        map
    }

    fn status(result: actix_web::Result<()>) -> StatusCode {
        result
            .expect_err("origin should be rejected")
            .as_response_error()
            .status_code()
    }

    #[rstest]
    #[case("http://localhost:5173")]
    #[case("https://shop.example")]
    #[case("https://shop.example:443")]
    fn accepts_listed_origins(allow_list: AllowedOrigins, #[case] origin: &str) {
        let headers = headers(&[HeaderValue::from_str(origin).expect("header")]);
        assert!(allow_list.validate(&headers).is_ok());
    }

    #[rstest]
    #[case(&[], StatusCode::FORBIDDEN)]
    #[case(&[HeaderValue::from_static("https://evil.example")], StatusCode::FORBIDDEN)]
    #[case(&[HeaderValue::from_static("http://shop.example")], StatusCode::FORBIDDEN)]
    #[case(&[HeaderValue::from_static("not a url")], StatusCode::BAD_REQUEST)]
    #[case(
        &[HeaderValue::from_static("https://shop.example"), HeaderValue::from_static("https://evil.example")],
        StatusCode::BAD_REQUEST
    )]
    fn rejects_unlisted_or_invalid_origins(
        allow_list: AllowedOrigins,
        #[case] values: &[HeaderValue],
        #[case] expected: StatusCode,
    ) {
        assert_eq!(status(allow_list.validate(&headers(values))), expected);
    }

    #[test]
    fn rejects_non_utf8_origin_header() {
        let value = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
        let err = AllowedOrigins::new(["https://shop.example".to_owned()])
            .validate(&headers(&[value]));
        assert_eq!(status(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn open_list_accepts_anything() {
        assert!(AllowedOrigins::any().validate(&HeaderMap::new()).is_ok());
        let foreign = headers(&[HeaderValue::from_static("https://anywhere.example")]);
        assert!(AllowedOrigins::any().validate(&foreign).is_ok());
    }
}
