//! Maps protocol requests onto the conversion service.

use std::sync::Arc;

use ratemesh_fx::{ConversionService, FxError};
use ratemesh_protocol::{ProtocolError, Request, Response, StatusCode};
use tracing::{debug, error, instrument};

use crate::metrics::{Metrics, SharedMetrics};

/// Status reported to clients for a service failure.
pub fn status_for(err: &FxError) -> StatusCode {
    match err {
        FxError::CurrencyNotFound(_) | FxError::RateNotFound { .. } => StatusCode::NotFound,
        FxError::InvalidInput(_) => StatusCode::InvalidArgument,
        FxError::ArithmeticOverflow { .. } => StatusCode::Internal,
    }
}

/// Failure response carrying the error's message.
pub fn error_response(err: &FxError) -> Response {
    Response::error(status_for(err), err.to_string())
}

/// Answers requests from a shared [`ConversionService`].
#[derive(Clone)]
pub struct RatesHandler {
    service: Arc<ConversionService>,
    metrics: SharedMetrics,
}

impl RatesHandler {
    /// Create a handler over a service.
    pub fn new(service: Arc<ConversionService>) -> Self {
        Self {
            service,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Request counters.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Execute one request.
    ///
    /// Service calls run on the blocking pool: a publish holds the graph's
    /// writer lock for the whole propagation.
    #[instrument(skip_all)]
    pub async fn handle(&self, request: Request) -> Response {
        let service = self.service.clone();
        let result = tokio::task::spawn_blocking(move || match request {
            Request::Publish(publish) => service
                .add_rate(&publish.base_currency, &publish.quote_currency, &publish.price)
                .map(|()| Response::Published),
            Request::Convert(convert) => service
                .convert_str(&convert.from_currency, &convert.to_currency, &convert.from_amount)
                .map(Response::converted),
        })
        .await;

        let response = match result {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                debug!(error = %err, code = err.error_code(), "Request failed");
                error_response(&err)
            }
            Err(err) => {
                error!(error = %err, "Request task failed");
                Response::error(StatusCode::Internal, "Internal error")
            }
        };

        self.metrics.record(&response);
        response
    }

    /// Response for a line that could not be decoded.
    pub fn reject(&self, err: &ProtocolError) -> Response {
        debug!(error = %err, code = err.error_code(), "Rejected malformed request");
        let response = Response::error(StatusCode::InvalidArgument, err.to_string());
        self.metrics.record(&response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratemesh_protocol::decode_line;

    async fn setup_handler() -> RatesHandler {
        let handler = RatesHandler::new(Arc::new(ConversionService::new()));

        for (base, quote, price) in [
            ("BTC", "EUR", "50000.0000"),
            ("EUR", "USD", "1.2000"),
            ("USD", "RUB", "80.0000"),
            ("GBP", "JPY", "152.1400"),
        ] {
            let response = handler.handle(Request::publish(base, quote, price)).await;
            assert_eq!(response, Response::Published);
        }

        handler
    }

    #[tokio::test]
    async fn test_convert() {
        let handler = setup_handler().await;

        let response = handler.handle(Request::convert("BTC", "RUB", "1.0000")).await;
        assert_eq!(response, Response::converted("4800000.0000"));

        let response = handler.handle(Request::convert("RUB", "EUR", "96.0000")).await;
        assert_eq!(response, Response::converted("1.0000"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let handler = setup_handler().await;

        let response = handler.handle(Request::convert("test", "BTC", "0.9997")).await;
        assert_eq!(
            response,
            Response::error(StatusCode::NotFound, "Currency test was not found")
        );

        let response = handler.handle(Request::convert("JPY", "BTC", "50000.0000")).await;
        assert_eq!(
            response,
            Response::error(StatusCode::NotFound, "Rate JPY-BTC was not found")
        );
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let handler = setup_handler().await;

        let response = handler.handle(Request::publish("BTC", "EUR", "-1")).await;
        assert_eq!(response.status(), StatusCode::InvalidArgument);

        let response = handler.handle(Request::convert("BTC", "EUR", "lots")).await;
        assert_eq!(response.status(), StatusCode::InvalidArgument);

        let err = decode_line::<Request>("{").unwrap_err();
        assert_eq!(handler.reject(&err).status(), StatusCode::InvalidArgument);

        let snapshot = handler.metrics().snapshot();
        assert_eq!(snapshot.invalid_arguments, 3);
        assert_eq!(snapshot.publishes_accepted, 4);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&FxError::CurrencyNotFound("X".into())), StatusCode::NotFound);
        assert_eq!(
            status_for(&FxError::InvalidInput("bad".to_string())),
            StatusCode::InvalidArgument
        );

        let overflow = FxError::ArithmeticOverflow {
            from: "A".into(),
            to: "B".into(),
            amount: Default::default(),
        };
        assert_eq!(status_for(&overflow), StatusCode::Internal);
        assert_eq!(error_response(&overflow).status(), StatusCode::Internal);
    }
}
