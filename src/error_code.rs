//! Upstream service error codes.
//!
//! A failure envelope carries a numeric `code` attribute on its `<error>`
//! element. [`Error::Service`](crate::Error::Service) keeps that number
//! verbatim; this module gives the documented ones a name and a retry hint so
//! collaborators can branch without magic numbers.
//!
//! | Code | Variant | Retryable |
//! |------|---------|-----------|
//! | 2    | InvalidService | no |
//! | 6    | InvalidParameters | no |
//! | 9    | InvalidSessionKey | no |
//! | 11   | ServiceOffline | yes |
//! | 16   | TemporarilyUnavailable | yes |
//! | 29   | RateLimitExceeded | yes |
//!
//! ## Example
//!
//! ```rust
//! use lastfm_api::error_code::ServiceErrorCode;
//!
//! let code = ServiceErrorCode::from_code(29).unwrap();
//! assert_eq!(code.name(), "rate_limit_exceeded");
//! assert!(code.retryable());
//! ```

use std::fmt;

/// Documented upstream error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorCode {
    /// 2: This service does not exist
    InvalidService,
    /// 3: No method with that name in this package
    InvalidMethod,
    /// 4: Invalid authentication token supplied
    AuthenticationFailed,
    /// 5: This service doesn't exist in that format
    InvalidFormat,
    /// 6: Request is missing a required parameter, or the resource was not found
    InvalidParameters,
    /// 7: Invalid resource specified
    InvalidResource,
    /// 8: Most likely the backend service failed
    OperationFailed,
    /// 9: Please re-authenticate
    InvalidSessionKey,
    /// 10: You must be granted a valid key
    InvalidApiKey,
    /// 11: This service is temporarily offline
    ServiceOffline,
    /// 12: This station is only available to paid subscribers
    SubscribersOnly,
    /// 13: Invalid method signature supplied
    InvalidSignature,
    /// 14: This token has not been authorized
    UnauthorizedToken,
    /// 15: This token has expired
    TokenExpired,
    /// 16: There was a temporary error processing the request
    TemporarilyUnavailable,
    /// 17: User requires to be logged in
    LoginRequired,
    /// 18: This user has no free radio plays left
    TrialExpired,
    /// 20: There is not enough content to play this station
    NotEnoughContent,
    /// 21: This group does not have enough members for radio
    NotEnoughMembers,
    /// 22: This artist does not have enough fans for radio
    NotEnoughFans,
    /// 23: There are not enough neighbours for radio
    NotEnoughNeighbours,
    /// 26: This application is not allowed to make requests to the web services
    SuspendedApiKey,
    /// 27: This type of request is no longer supported
    Deprecated,
    /// 29: Your IP has made too many requests in a short period
    RateLimitExceeded,
}

impl ServiceErrorCode {
    /// Map a numeric code from an `<error code="…">` element.
    pub fn from_code(code: u32) -> Option<Self> {
        let c = match code {
            2 => Self::InvalidService,
            3 => Self::InvalidMethod,
            4 => Self::AuthenticationFailed,
            5 => Self::InvalidFormat,
            6 => Self::InvalidParameters,
            7 => Self::InvalidResource,
            8 => Self::OperationFailed,
            9 => Self::InvalidSessionKey,
            10 => Self::InvalidApiKey,
            11 => Self::ServiceOffline,
            12 => Self::SubscribersOnly,
            13 => Self::InvalidSignature,
            14 => Self::UnauthorizedToken,
            15 => Self::TokenExpired,
            16 => Self::TemporarilyUnavailable,
            17 => Self::LoginRequired,
            18 => Self::TrialExpired,
            20 => Self::NotEnoughContent,
            21 => Self::NotEnoughMembers,
            22 => Self::NotEnoughFans,
            23 => Self::NotEnoughNeighbours,
            26 => Self::SuspendedApiKey,
            27 => Self::Deprecated,
            29 => Self::RateLimitExceeded,
            _ => return None,
        };
        Some(c)
    }

    /// Returns the numeric wire code.
    #[inline]
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidService => 2,
            Self::InvalidMethod => 3,
            Self::AuthenticationFailed => 4,
            Self::InvalidFormat => 5,
            Self::InvalidParameters => 6,
            Self::InvalidResource => 7,
            Self::OperationFailed => 8,
            Self::InvalidSessionKey => 9,
            Self::InvalidApiKey => 10,
            Self::ServiceOffline => 11,
            Self::SubscribersOnly => 12,
            Self::InvalidSignature => 13,
            Self::UnauthorizedToken => 14,
            Self::TokenExpired => 15,
            Self::TemporarilyUnavailable => 16,
            Self::LoginRequired => 17,
            Self::TrialExpired => 18,
            Self::NotEnoughContent => 20,
            Self::NotEnoughMembers => 21,
            Self::NotEnoughFans => 22,
            Self::NotEnoughNeighbours => 23,
            Self::SuspendedApiKey => 26,
            Self::Deprecated => 27,
            Self::RateLimitExceeded => 29,
        }
    }

    /// Returns the snake_case name (e.g., `"invalid_session_key"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidService => "invalid_service",
            Self::InvalidMethod => "invalid_method",
            Self::AuthenticationFailed => "authentication_failed",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidParameters => "invalid_parameters",
            Self::InvalidResource => "invalid_resource",
            Self::OperationFailed => "operation_failed",
            Self::InvalidSessionKey => "invalid_session_key",
            Self::InvalidApiKey => "invalid_api_key",
            Self::ServiceOffline => "service_offline",
            Self::SubscribersOnly => "subscribers_only",
            Self::InvalidSignature => "invalid_signature",
            Self::UnauthorizedToken => "unauthorized_token",
            Self::TokenExpired => "token_expired",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
            Self::LoginRequired => "login_required",
            Self::TrialExpired => "trial_expired",
            Self::NotEnoughContent => "not_enough_content",
            Self::NotEnoughMembers => "not_enough_members",
            Self::NotEnoughFans => "not_enough_fans",
            Self::NotEnoughNeighbours => "not_enough_neighbours",
            Self::SuspendedApiKey => "suspended_api_key",
            Self::Deprecated => "deprecated",
            Self::RateLimitExceeded => "rate_limit_exceeded",
        }
    }

    /// Whether repeating the identical request later may succeed.
    ///
    /// This is a hint for the collaborator's own retry policy; the caller never retries.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::OperationFailed
                | Self::ServiceOffline
                | Self::TemporarilyUnavailable
                | Self::RateLimitExceeded
        )
    }

    /// Whether the failure means the session or token must be renewed.
    #[inline]
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidSessionKey
                | Self::UnauthorizedToken
                | Self::TokenExpired
                | Self::LoginRequired
        )
    }
}

impl fmt::Display for ServiceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_code_round_trips() {
        for code in 0..40 {
            if let Some(c) = ServiceErrorCode::from_code(code) {
                assert_eq!(c.code(), code);
            }
        }
    }

    #[test]
    fn gaps_in_the_table_are_unknown() {
        assert_eq!(ServiceErrorCode::from_code(0), None);
        assert_eq!(ServiceErrorCode::from_code(19), None);
        assert_eq!(ServiceErrorCode::from_code(28), None);
    }

    #[test]
    fn retry_and_reauth_hints() {
        assert!(ServiceErrorCode::TemporarilyUnavailable.retryable());
        assert!(!ServiceErrorCode::InvalidParameters.retryable());
        assert!(ServiceErrorCode::InvalidSessionKey.requires_reauth());
        assert!(!ServiceErrorCode::RateLimitExceeded.requires_reauth());
    }

    #[test]
    fn display_shows_code_and_name() {
        assert_eq!(
            ServiceErrorCode::InvalidSignature.to_string(),
            "13 (invalid_signature)"
        );
    }
}
