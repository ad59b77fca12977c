/// Logic Layer - Swap Optimizer
///
/// This layer is responsible for:
/// - Intermediate token discovery and two-hop bridge selection
/// - Turning sampled liquidity into fills and picking the best path per edge
/// - Fallback paths for routes relying on fragile liquidity
/// - Route search over the quote graph and off-exchange quote injection
pub mod bridge;
pub mod comparison_price;
pub mod config;
pub mod fills;
pub mod graph;
pub mod hop_optimizer;
pub mod market_operation_utils;
pub mod optimizer;
pub mod path;
pub mod pathfinder;
pub mod report;
pub mod rfq;
pub mod route_search;
pub mod source_filters;
pub mod token_pair;
pub mod types;

// Re-export key components from the logic layer
pub use bridge::{BridgeSelector, TwoHopBridge};
pub use comparison_price::{ComparisonPrice, get_comparison_prices};
pub use config::{BridgeTieBreak, FillOptimizerKind, GetMarketOrdersOpts, OptimizerConfig, RfqRequestOptions, RfqtOpts};
pub use fills::{Fill, create_fills};
pub use graph::{QuoteGraph, TokenAdjacencyConfig, TokenAdjacencyGraph, TokenPathSet};
pub use hop_optimizer::{HopOptimizer, HopRequest, does_path_need_fallback};
pub use market_operation_utils::{MarketOperationUtils, MarketOperationUtilsBuilder};
pub use optimizer::{BoundedSearchOptimizer, FillOptimizer, SampleRouterOptimizer, fill_optimizer_from_config};
pub use path::{Path, PathPenaltyOpts};
pub use pathfinder::Pathfinder;
pub use report::{OptimizerResultWithReport, PriceComparisonsReport, QuoteReport};
pub use rfq::inject_rfq_liquidity;
pub use route_search::{HopRouteSearch, find_routes};
pub use source_filters::SourceFilters;
pub use types::{
    DexSample, ExchangeProxyOverhead, HopQuotes, IndicativeQuote, LiquiditySource, MarketOperation, MarketSideLiquidity, NativeOrder,
    NativeOrderType, NativeOrderWithFillableAmounts, OptimizedHop, OptimizedOrder, OptimizerResult, SourceFlags, TokenAmountPerEth,
};
