use serde::Serialize;
use thiserror::Error;

/// Error taxonomy shared by every exchange adapter.
///
/// Adapters classify failures as early as possible: validation errors are
/// raised before any network round trip, vendor errors only after a 2xx
/// response whose envelope encodes a failure.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Caller supplied a market type, interval, symbol, period, limit or
    /// parameter combination outside the adapter's declared enumeration.
    #[error("{0}")]
    Validation(String),

    /// The operation exists on the contract but this exchange does not
    /// implement it.
    #[error("{0}")]
    Unsupported(String),

    /// Transport failure or non-2xx status, surfaced after the retry budget
    /// is exhausted.
    #[error("network request failed: {0}")]
    Network(String),

    /// The HTTP call succeeded but the vendor's response envelope encodes a
    /// failure code (e.g. Bybit's retCode).
    #[error("{0}")]
    Vendor(String),

    /// The response body could not be decoded into the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Anything not classified above.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExchangeError {
    /// Only transport/status failures are worth retrying; malformed payloads
    /// and caller mistakes will fail identically on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExchangeError::Network(_))
    }

    /// Category label used by the operation boundary when it maps errors to
    /// the uniform payload.
    pub fn category(&self) -> &'static str {
        match self {
            ExchangeError::Validation(_) => "Invalid input",
            ExchangeError::Unsupported(_) => "Feature not supported",
            ExchangeError::Network(_) => "API request failed",
            ExchangeError::Vendor(_) => "Exchange API error",
            ExchangeError::UnexpectedResponse(_) | ExchangeError::Internal(_) => {
                "Unexpected error"
            }
        }
    }

    /// Convert into the structured payload returned across the operation
    /// boundary. `params` carries the request parameters that were in effect.
    pub fn to_payload(&self, params: serde_json::Value) -> ErrorPayload {
        ErrorPayload {
            error: self.category().to_string(),
            message: self.to_string(),
            params,
        }
    }
}

/// Uniform error payload: nothing crosses the operation boundary as a raw
/// fault.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub message: String,
    pub params: serde_json::Value,
}
