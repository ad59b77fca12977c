use super::fills::{Fill, SourcePathId};
use super::token_pair::taker_maker_from_input_output;
use super::types::{ExchangeProxyOverhead, FillOrderType, LiquiditySource, MarketOperation, OptimizedOrder, SourceFlags};
use crate::utils::{apply_slippage_down, apply_slippage_up, mul_div, mul_div_ceil, u256_to_f64};
use alloy_primitives::{Address, U256};

/// Converts an amount of the native fee token (wei) into output token units.
///
/// Uses the output token's ETH price when known, otherwise goes through the input
/// token's ETH price and the given input/output ratio.
pub fn eth_to_output_amount(input: f64, output: f64, input_amount_per_eth: f64, output_amount_per_eth: f64, eth_amount: f64) -> f64 {
    if output_amount_per_eth != 0.0 {
        return output_amount_per_eth * eth_amount;
    }
    if input_amount_per_eth == 0.0 || input == 0.0 {
        return 0.0;
    }
    input_amount_per_eth * eth_amount * (output / input)
}

/// Output per input for sells, input per output for buys. Higher is better on both sides.
pub fn get_rate(side: MarketOperation, input: f64, output: f64) -> f64 {
    if input == 0.0 || output == 0.0 {
        return 0.0;
    }
    match side {
        MarketOperation::Sell => output / input,
        MarketOperation::Buy => input / output,
    }
}

/// Rate penalized by the share of `target_input` actually covered.
pub fn get_complete_rate(side: MarketOperation, input: f64, output: f64, target_input: f64) -> f64 {
    if input == 0.0 || output == 0.0 || target_input == 0.0 {
        return 0.0;
    }
    match side {
        // (o / i) * (i / t)
        MarketOperation::Sell => output / target_input,
        // (i / o) * (i / t)
        MarketOperation::Buy => (input / output) * (input / target_input),
    }
}

/// Everything needed to price the costs of a path in output units.
#[derive(Clone, Debug, Default)]
pub struct PathPenaltyOpts {
    pub output_amount_per_eth: f64,
    pub input_amount_per_eth: f64,
    pub exchange_proxy_overhead: ExchangeProxyOverhead,
    pub gas_price: U256,
}

impl PathPenaltyOpts {
    pub fn with_exchange_proxy_overhead(&self, exchange_proxy_overhead: ExchangeProxyOverhead) -> Self {
        Self { exchange_proxy_overhead, ..self.clone() }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PathSize {
    pub input: U256,
    pub output: U256,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AdjustedPathSize {
    pub input: f64,
    pub output: f64,
}

/// Fills merged by source, before being turned into orders.
#[derive(Clone, Debug)]
struct CollapsedFill {
    source_path_id: SourcePathId,
    source: LiquiditySource,
    order_type: FillOrderType,
    input: U256,
    output: U256,
    fill_count: usize,
    native_order: Option<std::sync::Arc<crate::logic::types::NativeOrderWithFillableAmounts>>,
}

/// Ordered fills for one edge, with running size and cost accounting.
#[derive(Clone, Debug)]
pub struct Path {
    pub side: MarketOperation,
    pub fills: Vec<Fill>,
    pub target_input: U256,
    pub penalty_opts: PathPenaltyOpts,
    pub source_flags: SourceFlags,
    size: PathSize,
    adjusted_size: AdjustedPathSize,
    fallback: Option<Box<Path>>,
}

impl Path {
    pub fn create(side: MarketOperation, fills: Vec<Fill>, target_input: U256, penalty_opts: PathPenaltyOpts) -> Self {
        let mut path = Self {
            side,
            fills: Vec::with_capacity(fills.len()),
            target_input,
            penalty_opts,
            source_flags: SourceFlags::EMPTY,
            size: PathSize::default(),
            adjusted_size: AdjustedPathSize::default(),
            fallback: None,
        };
        for fill in fills {
            path.append(fill);
        }
        path
    }

    pub fn append(&mut self, fill: Fill) -> &mut Self {
        self.source_flags |= fill.flags;
        self.add_fill_size(&fill);
        self.fills.push(fill);
        self
    }

    fn add_fill_size(&mut self, fill: &Fill) {
        if self.size.input + fill.input > self.target_input {
            let remaining_input = self.target_input.saturating_sub(self.size.input);
            let scaled_output = match self.side {
                MarketOperation::Sell => mul_div(fill.output, remaining_input, fill.input),
                MarketOperation::Buy => mul_div_ceil(fill.output, remaining_input, fill.input),
            };
            self.size.input = self.target_input;
            self.size.output += scaled_output;
            // Penalty is not interpolated
            let penalty = fill.adjusted_output - u256_to_f64(fill.output);
            self.adjusted_size.input = u256_to_f64(self.target_input);
            self.adjusted_size.output += u256_to_f64(scaled_output) + penalty;
        } else {
            self.size.input += fill.input;
            self.size.output += fill.output;
            self.adjusted_size.input += u256_to_f64(fill.input);
            self.adjusted_size.output += fill.adjusted_output;
        }
    }

    /// Keeps the native fills of this path and replaces the rest with `fallback`'s
    /// fills. A trailing native partial fill after a non-native fill is dropped.
    /// The size stays the one of the primary path.
    pub fn add_fallback(mut self, fallback: Path) -> Self {
        let mut reversed = self.fills.iter().rev();
        let drop_last_native = match (reversed.next(), reversed.next()) {
            (Some(last), Some(penultimate)) => last.source == LiquiditySource::Native && penultimate.source != LiquiditySource::Native,
            _ => false,
        };
        let native_count = self.fills.iter().filter(|f| f.source == LiquiditySource::Native).count();
        let keep_natives = if drop_last_native { native_count - 1 } else { native_count };

        let mut fills: Vec<Fill> =
            self.fills.iter().filter(|f| f.source == LiquiditySource::Native).take(keep_natives).cloned().collect();
        fills.extend(fallback.fills.iter().cloned());

        self.source_flags = fills.iter().fold(SourceFlags::EMPTY, |flags, fill| flags | fill.flags);
        self.fills = fills;
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn fallback(&self) -> Option<&Path> {
        self.fallback.as_deref()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn size(&self) -> PathSize {
        self.size
    }

    /// Size net of fill penalties and the exchange proxy overhead for this path's sources.
    pub fn adjusted_size(&self) -> AdjustedPathSize {
        let AdjustedPathSize { input, output } = self.adjusted_size;
        let opts = &self.penalty_opts;
        let gas_overhead = opts.exchange_proxy_overhead.cost(self.source_flags);
        let path_penalty = eth_to_output_amount(input, output, opts.input_amount_per_eth, opts.output_amount_per_eth, gas_overhead);
        let output = match self.side {
            MarketOperation::Sell => output - path_penalty,
            MarketOperation::Buy => output + path_penalty,
        };
        AdjustedPathSize { input, output }
    }

    pub fn adjusted_complete_rate(&self) -> f64 {
        let AdjustedPathSize { input, output } = self.adjusted_size();
        get_complete_rate(self.side, input, output, u256_to_f64(self.target_input))
    }

    pub fn adjusted_rate(&self) -> f64 {
        let AdjustedPathSize { input, output } = self.adjusted_size();
        get_rate(self.side, input, output)
    }

    /// Relative rate loss against `max_adjusted_rate`.
    pub fn adjusted_slippage(&self, max_adjusted_rate: f64) -> f64 {
        if max_adjusted_rate == 0.0 {
            return 0.0;
        }
        (max_adjusted_rate - self.adjusted_rate()) / max_adjusted_rate
    }

    /// Best raw rate among the fills.
    pub fn best_rate(&self) -> f64 {
        self.fills
            .iter()
            .map(|f| get_rate(self.side, u256_to_f64(f.input), u256_to_f64(f.output)))
            .fold(0.0, f64::max)
    }

    pub fn is_complete(&self) -> bool {
        self.size.input >= self.target_input
    }

    /// Incomplete paths compare by filled input, complete ones by adjusted complete rate.
    pub fn is_better_than(&self, other: &Path) -> bool {
        if !self.is_complete() || !other.is_complete() {
            return self.size.input > other.size.input;
        }
        self.adjusted_complete_rate() > other.adjusted_complete_rate()
    }

    /// A fill with a parent may only directly follow it.
    pub fn is_valid_next_fill(&self, fill: &Fill) -> bool {
        let Some(last) = self.fills.last() else {
            return !fill.has_parent();
        };
        if fill.is_child_of(last) {
            return true;
        }
        !fill.has_parent()
    }

    fn collapse_fills(&self) -> Vec<CollapsedFill> {
        let mut collapsed: Vec<CollapsedFill> = Vec::new();
        for fill in self.fills.iter() {
            if fill.source != LiquiditySource::Native {
                if let Some(prev) = collapsed.last_mut() {
                    if prev.source_path_id == fill.source_path_id {
                        prev.input += fill.input;
                        prev.output += fill.output;
                        prev.fill_count += 1;
                        continue;
                    }
                }
            }
            collapsed.push(CollapsedFill {
                source_path_id: fill.source_path_id,
                source: fill.source,
                order_type: fill.order_type,
                input: fill.input,
                output: fill.output,
                fill_count: 1,
                native_order: fill.native_order.clone(),
            });
        }
        collapsed
    }

    /// Turns the fills into orders. Bridge orders carry worst-case amounts under
    /// `bridge_slippage`; each native fill becomes its own order.
    pub fn collapse(&self, input_token: Address, output_token: Address, bridge_slippage: f64) -> Vec<OptimizedOrder> {
        let (taker_token, maker_token) = taker_maker_from_input_output(self.side, input_token, output_token);
        self.collapse_fills()
            .into_iter()
            .map(|fill| {
                let (maker_amount, taker_amount) = match (self.side, fill.order_type) {
                    (MarketOperation::Sell, FillOrderType::Bridge) => (apply_slippage_down(fill.output, bridge_slippage), fill.input),
                    (MarketOperation::Buy, FillOrderType::Bridge) => (fill.input, apply_slippage_up(fill.output, bridge_slippage)),
                    (MarketOperation::Sell, _) => (fill.output, fill.input),
                    (MarketOperation::Buy, _) => (fill.input, fill.output),
                };
                OptimizedOrder {
                    source: fill.source,
                    order_type: fill.order_type,
                    maker_token,
                    taker_token,
                    maker_amount,
                    taker_amount,
                    native_order: fill.native_order,
                    fill_count: fill.fill_count,
                }
            })
            .collect()
    }
}
