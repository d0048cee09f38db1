use std::fmt;

/// Error produced when turning received bytes into the typed model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Failure modes of a single fetch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The transport delivered bytes, but decoding them failed.
    Parse(String),
    /// The transport failed before a model could be produced.
    Transport(String),
    /// The operation was cancelled. Intercepted by the provider and never
    /// surfaced as an error state.
    Cancelled,
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        FetchError::Transport(message.into())
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Parse(msg) => write!(f, "parse error: {msg}"),
            FetchError::Transport(msg) => write!(f, "transport error: {msg}"),
            FetchError::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<ParseError> for FetchError {
    fn from(err: ParseError) -> Self {
        FetchError::Parse(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_converts_to_fetch_error() {
        let parse = ParseError::new("unexpected end of input");
        let fetch: FetchError = parse.into();

        assert_eq!(
            fetch,
            FetchError::Parse("unexpected end of input".to_string())
        );
        assert!(!fetch.is_cancellation());
    }

    #[test]
    fn test_cancellation_is_not_a_user_visible_failure() {
        assert!(FetchError::Cancelled.is_cancellation());
        assert!(!FetchError::transport("connection reset").is_cancellation());
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(
            FetchError::transport("server returned 503").to_string(),
            "transport error: server returned 503"
        );
        assert_eq!(FetchError::Cancelled.to_string(), "operation cancelled");
        assert_eq!(
            ParseError::new("bad json").to_string(),
            "parse error: bad json"
        );
    }

    #[test]
    fn test_serde_json_error_maps_to_parse_error() {
        let err = serde_json::from_str::<Vec<String>>("{not json").unwrap_err();
        let parse: ParseError = err.into();
        assert!(!parse.message().is_empty());
    }
}
