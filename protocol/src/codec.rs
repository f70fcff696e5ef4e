//! Newline-delimited JSON framing.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Framing errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Empty message")]
    EmptyMessage,

    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Request line exceeds {0} bytes")]
    LineTooLong(usize),
}

impl ProtocolError {
    /// Get error code for protocol responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ProtocolError::EmptyMessage => "EMPTY_MESSAGE",
            ProtocolError::Malformed(_) => "MALFORMED_MESSAGE",
            ProtocolError::LineTooLong(_) => "LINE_TOO_LONG",
        }
    }
}

/// Result type for framing operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Serialize a message as one line, newline included.
pub fn encode_line<T: Serialize>(message: &T) -> ProtocolResult<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Parse one line, ignoring surrounding whitespace.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> ProtocolResult<T> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    Ok(serde_json::from_str(trimmed)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Request, Response, StatusCode};

    #[test]
    fn test_encoded_line_is_single_line() {
        let line = encode_line(&Request::publish("BTC", "EUR", "50000.0000")).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let decoded: Request = decode_line(&line).unwrap();
        assert_eq!(decoded, Request::publish("BTC", "EUR", "50000.0000"));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_line::<Request>("   \r\n"), Err(ProtocolError::EmptyMessage)));

        let err = decode_line::<Request>("{\"type\":\"CONVERT\"}").unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_MESSAGE");

        assert!(decode_line::<Response>("not json").is_err());
    }

    #[test]
    fn test_decode_response() {
        let response: Response =
            decode_line("{\"type\":\"ERROR\",\"status\":\"INVALID_ARGUMENT\",\"message\":\"bad\"}\n").unwrap();
        assert_eq!(response, Response::error(StatusCode::InvalidArgument, "bad"));
    }
}
