pub mod cache;
pub mod error;
pub mod http;
pub mod retry;
pub mod traits;
pub mod types;

pub use cache::PairCache;
pub use error::{ErrorPayload, ExchangeError};
pub use http::HttpResource;
pub use retry::{execute_with_retry, RetryConfig};
pub use traits::*;
pub use types::*;
