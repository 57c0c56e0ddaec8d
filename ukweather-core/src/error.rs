//! Error taxonomy shared by the forecast operations.
//!
//! [`FetchError`] is what the upstream client reports and may carry raw
//! upstream detail. [`ErrorKind`] is the closed set a caller ever sees; every
//! variant has a fixed message and nothing from the upstream body leaks into it.

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Latitude must be between -90 and 90 degrees")]
    LatitudeOutOfRange { value: f64 },

    #[error("Longitude must be between -180 and 180 degrees")]
    LongitudeOutOfRange { value: f64 },
}

/// Raw failure of a single upstream call.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no API key configured")]
    MissingCredential,

    #[error("upstream responded with status {status}")]
    Status { status: u16, body: String },

    #[error("upstream returned no forecast data for the point")]
    NoData,

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("failed to decode forecast document: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// User-facing failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ErrorKind {
    #[error("{0}")]
    InvalidCoordinate(CoordinateError),

    #[error(
        "MET_OFFICE_API_KEY environment variable is not set. \
         Set it to your Met Office DataHub API key or run `ukweather configure`."
    )]
    MissingCredential,

    #[error(
        "API key invalid or missing. \
         Please check the MET_OFFICE_API_KEY environment variable is set correctly."
    )]
    AuthenticationFailed,

    #[error("Rate limit exceeded. Please wait a few moments before making more requests.")]
    RateLimited,

    #[error(
        "Weather data not available for this location. \
         The coordinates may be outside the service area."
    )]
    LocationUnavailable,

    #[error(
        "Request timed out. The Met Office API may be experiencing issues. Please try again."
    )]
    UpstreamTimeout,

    #[error("Could not connect to Met Office API. Please check your internet connection.")]
    UpstreamUnreachable,

    #[error(
        "Met Office API returned an unexpected response. Please try again later."
    )]
    UpstreamMalformedResponse,
}

impl ErrorKind {
    /// Map an upstream failure onto the taxonomy. Anything not recognised is
    /// reported as [`ErrorKind::UpstreamMalformedResponse`].
    pub fn classify(failure: &FetchError) -> Self {
        match failure {
            FetchError::MissingCredential => ErrorKind::MissingCredential,
            FetchError::Status { status, body } => {
                warn!(status, "Met Office request failed");
                debug!(body = %truncate_body(body), "Met Office error body");
                classify_status(*status, body)
            }
            FetchError::NoData => ErrorKind::LocationUnavailable,
            FetchError::Timeout(detail) => {
                warn!(%detail, "Met Office request timed out");
                ErrorKind::UpstreamTimeout
            }
            FetchError::Connect(detail) => {
                warn!(%detail, "could not reach Met Office API");
                ErrorKind::UpstreamUnreachable
            }
            FetchError::Decode(detail) | FetchError::Transport(detail) => {
                warn!(%detail, "unusable Met Office response");
                ErrorKind::UpstreamMalformedResponse
            }
        }
    }

    /// Single-line message with the `Error: ` prefix callers key on.
    pub fn user_message(&self) -> String {
        format!("Error: {self}")
    }
}

impl From<CoordinateError> for ErrorKind {
    fn from(err: CoordinateError) -> Self {
        ErrorKind::InvalidCoordinate(err)
    }
}

impl From<&FetchError> for ErrorKind {
    fn from(failure: &FetchError) -> Self {
        ErrorKind::classify(failure)
    }
}

fn classify_status(status: u16, body: &str) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::AuthenticationFailed,
        404 => ErrorKind::LocationUnavailable,
        429 => ErrorKind::RateLimited,
        400 | 422 if says_no_data(body) => ErrorKind::LocationUnavailable,
        _ => ErrorKind::UpstreamMalformedResponse,
    }
}

fn says_no_data(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("no data") || (lower.contains("outside") && lower.contains("area"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn auth_statuses_map_to_authentication_failed() {
        assert_eq!(ErrorKind::classify(&status(401)), ErrorKind::AuthenticationFailed);
        assert_eq!(ErrorKind::classify(&status(403)), ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn not_found_and_no_data_map_to_location_unavailable() {
        assert_eq!(ErrorKind::classify(&status(404)), ErrorKind::LocationUnavailable);
        assert_eq!(ErrorKind::classify(&FetchError::NoData), ErrorKind::LocationUnavailable);

        let bad_point = FetchError::Status {
            status: 400,
            body: r#"{"message":"No data for point"}"#.to_string(),
        };
        assert_eq!(ErrorKind::classify(&bad_point), ErrorKind::LocationUnavailable);
    }

    #[test]
    fn rate_limit_is_recognised() {
        assert_eq!(ErrorKind::classify(&status(429)), ErrorKind::RateLimited);
    }

    #[test]
    fn network_failures_are_classified() {
        assert_eq!(
            ErrorKind::classify(&FetchError::Timeout("slow".into())),
            ErrorKind::UpstreamTimeout
        );
        assert_eq!(
            ErrorKind::classify(&FetchError::Connect("refused".into())),
            ErrorKind::UpstreamUnreachable
        );
    }

    #[test]
    fn unrecognised_failures_fall_back_to_malformed() {
        for failure in [
            status(400),
            status(500),
            status(503),
            FetchError::Decode("eof".into()),
            FetchError::Transport("redirect loop".into()),
        ] {
            assert_eq!(
                ErrorKind::classify(&failure),
                ErrorKind::UpstreamMalformedResponse,
                "{failure}"
            );
        }
    }

    #[test]
    fn messages_never_echo_upstream_body() {
        let failure = FetchError::Status {
            status: 500,
            body: "stack trace: secret-internal-detail".to_string(),
        };
        let message = ErrorKind::classify(&failure).user_message();

        assert!(message.starts_with("Error: "));
        assert!(!message.contains("secret-internal-detail"));
    }

    #[test]
    fn coordinate_messages_name_axis_and_bounds() {
        let lat = ErrorKind::from(CoordinateError::LatitudeOutOfRange { value: 100.0 });
        let lon = ErrorKind::from(CoordinateError::LongitudeOutOfRange { value: 200.0 });

        assert_eq!(lat.user_message(), "Error: Latitude must be between -90 and 90 degrees");
        assert_eq!(lon.user_message(), "Error: Longitude must be between -180 and 180 degrees");
    }

    #[test]
    fn missing_credential_names_the_variable() {
        let message = ErrorKind::MissingCredential.user_message();
        assert!(message.contains(crate::config::API_KEY_ENV));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);

        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }
}
