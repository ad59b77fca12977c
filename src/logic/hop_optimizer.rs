use super::optimizer::FillOptimizer;
use super::path::{Path, PathPenaltyOpts};
use super::types::{DexSample, ExchangeProxyOverhead, MarketOperation, NativeOrderWithFillableAmounts, OptimizedHop};
use alloy_primitives::{Address, U256};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// Liquidity and target for one edge of a route.
#[derive(Debug, Clone, Copy)]
pub struct HopRequest<'a> {
    pub side: MarketOperation,
    pub input_token: Address,
    pub output_token: Address,
    pub input_amount: U256,
    pub dex_quotes: &'a [Vec<DexSample>],
    pub native_orders: &'a [NativeOrderWithFillableAmounts],
    pub input_amount_per_eth: f64,
    pub output_amount_per_eth: f64,
}

/// Optimizes single edges: finds the best path, attaches a sturdy fallback when the
/// path relies on fragile sources, and collapses it into orders.
#[derive(Clone)]
pub struct HopOptimizer {
    fill_optimizer: Arc<dyn FillOptimizer>,
    pub gas_price: U256,
    pub exchange_proxy_overhead: ExchangeProxyOverhead,
    pub bridge_slippage: f64,
    pub max_fallback_slippage: f64,
    pub allow_fallback: bool,
}

impl Debug for HopOptimizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HopOptimizer")
            .field("fill_optimizer", &self.fill_optimizer.kind())
            .field("gas_price", &self.gas_price)
            .field("bridge_slippage", &self.bridge_slippage)
            .field("max_fallback_slippage", &self.max_fallback_slippage)
            .field("allow_fallback", &self.allow_fallback)
            .finish()
    }
}

/// True when any fill of the path comes from a fragile source.
pub fn does_path_need_fallback(path: &Path) -> bool {
    path.fills.iter().any(|f| f.source.is_fragile())
}

impl HopOptimizer {
    pub fn new(fill_optimizer: Arc<dyn FillOptimizer>) -> Self {
        Self {
            fill_optimizer,
            gas_price: U256::ZERO,
            exchange_proxy_overhead: ExchangeProxyOverhead::zero(),
            bridge_slippage: 0.0,
            max_fallback_slippage: 0.0,
            allow_fallback: true,
        }
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_exchange_proxy_overhead(mut self, exchange_proxy_overhead: ExchangeProxyOverhead) -> Self {
        self.exchange_proxy_overhead = exchange_proxy_overhead;
        self
    }

    pub fn with_slippage(mut self, bridge_slippage: f64, max_fallback_slippage: f64) -> Self {
        self.bridge_slippage = bridge_slippage;
        self.max_fallback_slippage = max_fallback_slippage;
        self
    }

    pub fn with_allow_fallback(mut self, allow_fallback: bool) -> Self {
        self.allow_fallback = allow_fallback;
        self
    }

    fn penalty_opts(&self, request: &HopRequest<'_>) -> PathPenaltyOpts {
        PathPenaltyOpts {
            output_amount_per_eth: request.output_amount_per_eth,
            input_amount_per_eth: request.input_amount_per_eth,
            exchange_proxy_overhead: self.exchange_proxy_overhead.clone(),
            gas_price: self.gas_price,
        }
    }

    /// `None` when the edge cannot absorb the requested input.
    pub fn create_optimized_hop(&self, request: &HopRequest<'_>) -> Option<OptimizedHop> {
        let penalty_opts = self.penalty_opts(request);
        let mut path = self.find_optimal_path_from_samples(
            request.side,
            request.dex_quotes,
            request.native_orders,
            request.input_amount,
            &penalty_opts,
        )?;

        if self.allow_fallback && does_path_need_fallback(&path) {
            path = self.add_fallback_to_path(path, request, &penalty_opts);
        }

        let size = path.size();
        Some(OptimizedHop {
            orders: path.collapse(request.input_token, request.output_token, self.bridge_slippage),
            input_token: request.input_token,
            output_token: request.output_token,
            input_amount: size.input,
            output_amount: size.output,
            adjusted_complete_rate: path.adjusted_complete_rate(),
            source_flags: path.source_flags,
            has_fallback: path.has_fallback(),
        })
    }

    pub fn find_optimal_path_from_samples(
        &self,
        side: MarketOperation,
        dex_quotes: &[Vec<DexSample>],
        native_orders: &[NativeOrderWithFillableAmounts],
        input_amount: U256,
        penalty_opts: &PathPenaltyOpts,
    ) -> Option<Path> {
        self.fill_optimizer.find_optimal_path(side, dex_quotes, native_orders, input_amount, penalty_opts)
    }

    /// Attaches a path made only of sturdy DEX sources when it is close enough to the
    /// primary path, or unconditionally when the primary path is entirely fragile.
    pub fn add_fallback_to_path(&self, path: Path, request: &HopRequest<'_>, penalty_opts: &PathPenaltyOpts) -> Path {
        let path_rate = path.adjusted_rate();
        let fragile_fills = path.fills.iter().filter(|f| f.source.is_fragile()).count();
        let sturdy_samples: Vec<Vec<DexSample>> = request
            .dex_quotes
            .iter()
            .filter(|samples| samples.first().is_some_and(|s| !s.source.is_fragile()))
            .cloned()
            .collect();

        // the primary path's sources are already paid for
        let sturdy_opts = penalty_opts.with_exchange_proxy_overhead(penalty_opts.exchange_proxy_overhead.with_paid_flags(path.source_flags));
        let Some(sturdy_path) = self.find_optimal_path_from_samples(request.side, &sturdy_samples, &[], request.input_amount, &sturdy_opts)
        else {
            debug!(input_token = %request.input_token, output_token = %request.output_token, "No sturdy fallback path");
            return path;
        };

        let slippage = sturdy_path.adjusted_slippage(path_rate);
        if fragile_fills == path.fills.len() || slippage <= self.max_fallback_slippage {
            debug!(slippage, all_fragile = fragile_fills == path.fills.len(), "Attaching fallback path");
            return path.add_fallback(sturdy_path);
        }
        debug!(slippage, max_fallback_slippage = self.max_fallback_slippage, "Fallback path rejected");
        path
    }
}
