// Three-Layer Architecture
pub mod data_sync; // Data Layer: liquidity sampling, relayer quotes
pub mod logic; // Logic Layer: path discovery, fill optimization, route search

// Common utilities and types
pub mod error;
pub mod utils;

// Re-export key components from each layer
pub use data_sync::{FirmQuoteValidator, MockQuoteRequestor, MockSampler, QuoteRequestor, Sampler};
pub use error::{AggregationError, AggregationResult};
pub use logic::{
    GetMarketOrdersOpts, LiquiditySource, MarketOperation, MarketOperationUtils, MarketOperationUtilsBuilder, NativeOrder, OptimizerConfig,
    OptimizerResult, OptimizerResultWithReport,
};
pub use utils::Token;
