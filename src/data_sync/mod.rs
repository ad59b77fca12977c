/// Data Layer
///
/// Boundary to everything that fetches liquidity:
///
/// - `Sampler`: on-chain sample curves, prices and token metadata
/// - `QuoteRequestor` / `FirmQuoteValidator`: off-exchange relayer quotes
///
/// In-memory implementations of both are provided for tests and benchmarks.
pub mod mock_quote_requestor;
pub mod mock_sampler;
pub mod quote_requestor;
pub mod sampler;

pub use mock_quote_requestor::{MockFirmQuoteValidator, MockQuoteRequestor, RecordedRfqRequest};
pub use mock_sampler::MockSampler;
pub use quote_requestor::{FirmQuoteValidator, QuoteRequestor, RfqQuoteType};
pub use sampler::Sampler;
