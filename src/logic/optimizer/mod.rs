mod bounded_search;
mod sample_router;

pub use bounded_search::BoundedSearchOptimizer;
pub use sample_router::SampleRouterOptimizer;

use super::config::{FillOptimizerKind, OptimizerConfig};
use super::path::{Path, PathPenaltyOpts};
use super::types::{DexSample, MarketOperation, NativeOrderWithFillableAmounts};
use alloy_primitives::U256;
use std::sync::Arc;

/// Selects the best combination of fills for one edge.
///
/// Implementations return a path only when it covers the whole `target_input`.
pub trait FillOptimizer: Send + Sync {
    fn kind(&self) -> FillOptimizerKind;

    fn find_optimal_path(
        &self,
        side: MarketOperation,
        dex_quotes: &[Vec<DexSample>],
        native_orders: &[NativeOrderWithFillableAmounts],
        target_input: U256,
        penalty_opts: &PathPenaltyOpts,
    ) -> Option<Path>;
}

pub fn fill_optimizer_from_config(config: &OptimizerConfig) -> Arc<dyn FillOptimizer> {
    match config.fill_optimizer {
        FillOptimizerKind::BoundedSearch => Arc::new(BoundedSearchOptimizer::new(config.run_limit)),
        FillOptimizerKind::SampleRouter => Arc::new(SampleRouterOptimizer::new(config.sample_router_steps)),
    }
}
