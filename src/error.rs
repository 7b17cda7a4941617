//! Public error taxonomy for diagnosis requests.
//!
//! Every user-visible failure maps to a stable machine-readable code and an
//! HTTP status. Internal failure detail (the last scrape attempt's error
//! chain, upstream status lines) travels in the variant payload and is only
//! ever surfaced as auxiliary debug data, never as the primary message.

use thiserror::Error;

/// Terminal outcome of a diagnosis request.
#[derive(Debug, Error)]
pub enum DiagnosisError {
    /// Input rejected before pipeline entry.
    #[error("input is empty or not a recognizable listing URL")]
    InvalidUrl,

    /// Resolution completed but produced no listing identifier. Recoverable
    /// by the user supplying a more specific link.
    #[error("no place identifier could be extracted from the URL")]
    PlaceIdNotFound,

    /// The shared deadline elapsed before any candidate rendered.
    #[error("diagnosis deadline elapsed before the listing finished rendering")]
    Timeout,

    /// Every candidate failed for a non-timeout reason.
    #[error("all scrape candidates failed")]
    ScrapeFailed { detail: String },

    /// Social path: profile page fetched but the expected structure is absent.
    #[error("profile page fetched but its structure could not be parsed")]
    ParseFailed,

    /// Social path: profile does not exist.
    #[error("profile not found")]
    NotFound,

    /// Social path: transient upstream failure, safe to retry later.
    #[error("upstream fetch failed")]
    Upstream { detail: String },
}

impl DiagnosisError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "INVALID_URL",
            Self::PlaceIdNotFound => "PLACE_ID_NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::ScrapeFailed { .. } => "SCRAPE_FAILED",
            Self::ParseFailed => "PARSE_FAILED",
            Self::NotFound => "NOT_FOUND",
            Self::Upstream { .. } => "UPSTREAM",
        }
    }

    /// HTTP status this error maps to at the API boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidUrl => 400,
            Self::PlaceIdNotFound => 422,
            Self::Timeout => 504,
            Self::ScrapeFailed { .. } => 500,
            Self::ParseFailed => 422,
            Self::NotFound => 404,
            Self::Upstream { .. } => 503,
        }
    }

    /// Auxiliary debug detail, when the variant carries any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::ScrapeFailed { detail } | Self::Upstream { detail } => Some(detail),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        assert_eq!(DiagnosisError::InvalidUrl.code(), "INVALID_URL");
        assert_eq!(DiagnosisError::InvalidUrl.http_status(), 400);
        assert_eq!(DiagnosisError::PlaceIdNotFound.http_status(), 422);
        assert_eq!(DiagnosisError::Timeout.http_status(), 504);
        let sf = DiagnosisError::ScrapeFailed {
            detail: "navigation failed".into(),
        };
        assert_eq!(sf.http_status(), 500);
        assert_eq!(sf.detail(), Some("navigation failed"));
        assert_eq!(DiagnosisError::NotFound.http_status(), 404);
        assert_eq!(DiagnosisError::ParseFailed.http_status(), 422);
        assert_eq!(
            DiagnosisError::Upstream { detail: "503".into() }.http_status(),
            503
        );
    }

    #[test]
    fn test_primary_message_has_no_internal_detail() {
        let e = DiagnosisError::ScrapeFailed {
            detail: "ERR_CONNECTION_REFUSED at 10.0.0.3".into(),
        };
        assert!(!e.to_string().contains("10.0.0.3"));
    }
}
