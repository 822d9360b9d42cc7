use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("could not obtain access token: {0}")]
    Auth(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the call is worth repeating after a pause.
    ///
    /// 403 is included because the API reports exhausted quota and
    /// rate limiting with it. Transport and decode errors are retried;
    /// credential failures never are.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http { status, .. } => matches!(status, 403 | 429 | 500..=599),
            ApiError::Transport(_) | ApiError::Decode(_) => true,
            ApiError::Auth(_) => false,
        }
    }

    /// The access token could not be obtained or was rejected; every
    /// following call would fail the same way.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, ApiError::Auth(_) | ApiError::Http { status: 401, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ApiError {
        ApiError::Http {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn classifies_statuses() {
        for status in [403, 429, 500, 503, 599] {
            assert!(http(status).is_transient(), "{status} should be transient");
        }
        for status in [400, 401, 404, 409] {
            assert!(!http(status).is_transient(), "{status} should be permanent");
        }
    }

    #[test]
    fn non_http_errors_are_transient() {
        assert!(ApiError::Transport("connection reset".into()).is_transient());
        assert!(ApiError::Decode("eof".into()).is_transient());
        assert_eq!(ApiError::Transport("x".into()).status(), None);
    }

    #[test]
    fn credential_failures_are_not_retried() {
        let refused = ApiError::Auth("invalid_grant".into());
        assert!(!refused.is_transient());
        assert!(refused.is_credential_failure());
        assert!(http(401).is_credential_failure());
        assert!(!http(403).is_credential_failure());
        assert!(!ApiError::Transport("reset".into()).is_credential_failure());
    }
}
