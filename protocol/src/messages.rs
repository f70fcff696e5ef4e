//! Protocol message types.
//!
//! These types represent the requests a client sends to a rates node and
//! the responses it gets back.

use serde::{Deserialize, Serialize};

/// Publish request: 1 unit of base is worth `price` units of quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Base currency identifier.
    pub base_currency: String,
    /// Quote currency identifier.
    pub quote_currency: String,
    /// Price as a decimal string.
    pub price: String,
}

/// Convert request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertRequest {
    /// Currency the amount is expressed in.
    pub from_currency: String,
    /// Currency to convert into.
    pub to_currency: String,
    /// Amount as a decimal string.
    pub from_amount: String,
}

/// Convert response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertResponse {
    /// Converted amount, always with 4 fractional digits.
    pub price: String,
}

/// Request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Publish(PublishRequest),
    Convert(ConvertRequest),
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// The rate was accepted.
    Published,
    /// Result of a conversion.
    Converted(ConvertResponse),
    /// The request failed.
    Error {
        status: StatusCode,
        message: String,
    },
}

/// Outcome category of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// Request succeeded.
    Ok,
    /// A currency is unknown or no rate connects the pair.
    NotFound,
    /// Malformed or out-of-range input.
    InvalidArgument,
    /// Unexpected failure inside the node.
    Internal,
}

impl Request {
    /// Build a publish request.
    pub fn publish(base: impl Into<String>, quote: impl Into<String>, price: impl Into<String>) -> Self {
        Request::Publish(PublishRequest {
            base_currency: base.into(),
            quote_currency: quote.into(),
            price: price.into(),
        })
    }

    /// Build a convert request.
    pub fn convert(from: impl Into<String>, to: impl Into<String>, amount: impl Into<String>) -> Self {
        Request::Convert(ConvertRequest {
            from_currency: from.into(),
            to_currency: to.into(),
            from_amount: amount.into(),
        })
    }
}

impl Response {
    /// Build a conversion result.
    pub fn converted(price: impl Into<String>) -> Self {
        Response::Converted(ConvertResponse { price: price.into() })
    }

    /// Build a failure response.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Response::Error {
            status,
            message: message.into(),
        }
    }

    /// Status of this response.
    pub fn status(&self) -> StatusCode {
        match self {
            Response::Published | Response::Converted(_) => StatusCode::Ok,
            Response::Error { status, .. } => *status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = Request::convert("BTC", "EUR", "1.0000");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["type"], "CONVERT");
        assert_eq!(json["from_currency"], "BTC");
        assert_eq!(json["to_currency"], "EUR");
        assert_eq!(json["from_amount"], "1.0000");
    }

    #[test]
    fn test_error_response_wire_format() {
        let response = Response::error(StatusCode::NotFound, "Currency test was not found");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["type"], "ERROR");
        assert_eq!(json["status"], "NOT_FOUND");
        assert_eq!(json["message"], "Currency test was not found");
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_response_status() {
        assert_eq!(Response::Published.status(), StatusCode::Ok);
        assert_eq!(Response::converted("1.0000").status(), StatusCode::Ok);
    }

    #[test]
    fn test_publish_parses_from_client_json() {
        let json = r#"{"type":"PUBLISH","base_currency":"BTC","quote_currency":"EUR","price":"50000.0000"}"#;
        let request: Request = serde_json::from_str(json).unwrap();
        assert_eq!(request, Request::publish("BTC", "EUR", "50000.0000"));
    }
}
