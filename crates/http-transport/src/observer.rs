//! Request and response observation hooks.
//!
//! An observer is handed to the transport at construction and called
//! synchronously at two points of every action: once the request has been
//! built (before it is sent) and once the response head has arrived (before
//! the body is read). Observers cannot alter either.

use hypermedia::Timestamp;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::request::PreparedRequest;

/// Status, headers, and final URL of a response, as seen before its body is
/// read.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    /// Reason phrase sent by the server when it differs from the standard one.
    pub reason: Option<String>,
    pub headers: HeaderMap,
    /// URL the response came from, after redirects.
    pub url: String,
    pub received_at: Timestamp,
}

impl ResponseHead {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Status code and reason phrase, e.g. `"404 Not Found"`. The server's
    /// own phrase is preferred over the standard one.
    pub fn status_line(&self) -> String {
        let reason = self
            .reason
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or_default();
        format!("{} {reason}", self.status.as_u16())
            .trim_end()
            .to_owned()
    }
}

/// Receives a view of each request and response an [`crate::HttpTransport`]
/// handles. Both methods default to doing nothing.
pub trait RequestObserver: Send + Sync {
    fn on_request_built(&self, _request: &PreparedRequest) {}

    fn on_response_received(&self, _response: &ResponseHead) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(status: u16, reason: Option<&str>) -> ResponseHead {
        ResponseHead {
            status: StatusCode::from_u16(status).unwrap(),
            reason: reason.map(str::to_owned),
            headers: HeaderMap::new(),
            url: "http://api.test/".to_owned(),
            received_at: Timestamp::now(),
        }
    }

    #[test]
    fn status_line_prefers_the_server_reason() {
        assert_eq!(head(404, None).status_line(), "404 Not Found");
        assert_eq!(head(404, Some("Gone Fishing")).status_line(), "404 Gone Fishing");
        assert_eq!(head(599, None).status_line(), "599");
    }

    #[test]
    fn only_2xx_is_success() {
        assert!(head(204, None).is_success());
        assert!(!head(302, None).is_success());
    }
}
