use super::path::{eth_to_output_amount, get_rate};
use super::types::{
    DexSample, FillOrderType, LiquiditySource, MarketOperation, NativeOrderType, NativeOrderWithFillableAmounts, SourceFlags,
};
use crate::utils::constants::{LIMIT_ORDER_GAS, RFQ_ORDER_GAS};
use crate::utils::{mul_div, u256_to_f64};
use alloy_primitives::U256;
use std::cmp::Ordering;
use std::sync::Arc;

/// Identifies the chain of fills a fill belongs to. DEX curves use their position in
/// the sample list, the native order book uses [`NATIVE_SOURCE_PATH_ID`].
pub type SourcePathId = usize;

pub const NATIVE_SOURCE_PATH_ID: SourcePathId = usize::MAX;

/// One indivisible piece of a trade on one edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    pub source_path_id: SourcePathId,
    pub source: LiquiditySource,
    pub order_type: FillOrderType,
    pub input: U256,
    pub output: U256,
    /// Output after gas penalties, lower than `output` for sells and higher for buys
    pub adjusted_output: f64,
    pub adjusted_rate: f64,
    pub gas_cost: u64,
    pub flags: SourceFlags,
    /// Position in its chain. A fill with index > 0 may only follow the fill before it.
    pub index: usize,
    pub native_order: Option<Arc<NativeOrderWithFillableAmounts>>,
}

impl Fill {
    pub fn has_parent(&self) -> bool {
        self.index > 0
    }

    pub fn is_child_of(&self, other: &Fill) -> bool {
        self.has_parent() && other.source_path_id == self.source_path_id && other.index + 1 == self.index
    }
}

pub struct CreateFillsOpts<'a> {
    pub side: MarketOperation,
    pub orders: &'a [NativeOrderWithFillableAmounts],
    pub dex_quotes: &'a [Vec<DexSample>],
    pub target_input: U256,
    pub output_amount_per_eth: f64,
    pub input_amount_per_eth: f64,
    pub gas_price: U256,
}

pub fn native_order_gas(order_type: NativeOrderType) -> u64 {
    match order_type {
        NativeOrderType::Limit => LIMIT_ORDER_GAS,
        NativeOrderType::Rfq => RFQ_ORDER_GAS,
    }
}

fn apply_penalty(side: MarketOperation, output: f64, penalty: f64) -> f64 {
    match side {
        MarketOperation::Sell => output - penalty,
        MarketOperation::Buy => output + penalty,
    }
}

/// Turns one edge's liquidity into fill chains: one chain per DEX curve and one for
/// the native order book. Chains are clipped to the target and empty ones dropped.
pub fn create_fills(opts: CreateFillsOpts<'_>) -> Vec<Vec<Fill>> {
    let mut all_fills = Vec::with_capacity(opts.dex_quotes.len() + 1);

    let native_fills = native_orders_to_fills(&opts);
    all_fills.push(clip_fills_to_input(native_fills, opts.target_input));

    for (source_path_id, samples) in opts.dex_quotes.iter().enumerate() {
        let fills = dex_samples_to_fills(&opts, source_path_id, samples);
        all_fills.push(clip_fills_to_input(fills, opts.target_input));
    }

    all_fills.into_iter().filter(|fills| has_liquidity(fills)).collect()
}

fn native_orders_to_fills(opts: &CreateFillsOpts<'_>) -> Vec<Fill> {
    let side = opts.side;
    let mut fills: Vec<Fill> = Vec::new();
    for order in opts.orders.iter() {
        if order.fillable_taker_amount.is_zero() {
            continue;
        }
        let taker_amount = order.fillable_taker_amount + order.fillable_taker_fee_amount;
        let maker_amount = order.fillable_maker_amount;
        let (input, output) = match side {
            MarketOperation::Sell => (taker_amount, maker_amount),
            MarketOperation::Buy => (maker_amount, taker_amount),
        };
        if input.is_zero() {
            continue;
        }
        let clipped_input = input.min(opts.target_input);
        let clipped_output = if clipped_input == input { output } else { mul_div(output, clipped_input, input) };

        let gas_cost = native_order_gas(order.order.order_type);
        let fee = u256_to_f64(opts.gas_price) * gas_cost as f64;
        let penalty = eth_to_output_amount(
            u256_to_f64(clipped_input),
            u256_to_f64(clipped_output),
            opts.input_amount_per_eth,
            opts.output_amount_per_eth,
            fee,
        );
        let adjusted_output = apply_penalty(side, u256_to_f64(clipped_output), penalty);
        let adjusted_rate = get_rate(side, u256_to_f64(clipped_input), adjusted_output);
        // Skip orders that cost more than they return
        if adjusted_rate <= 0.0 {
            continue;
        }
        fills.push(Fill {
            source_path_id: NATIVE_SOURCE_PATH_ID,
            source: LiquiditySource::Native,
            order_type: order.order.order_type.into(),
            input: clipped_input,
            output: clipped_output,
            adjusted_output,
            adjusted_rate,
            gas_cost,
            flags: order.order.order_type.flag(),
            index: 0,
            native_order: Some(Arc::new(order.clone())),
        });
    }

    // Best orders first, then chain them so they are taken in that order
    fills.sort_by(|a, b| b.adjusted_rate.partial_cmp(&a.adjusted_rate).unwrap_or(Ordering::Equal));
    for (index, fill) in fills.iter_mut().enumerate() {
        fill.index = index;
    }
    fills
}

fn dex_samples_to_fills(opts: &CreateFillsOpts<'_>, source_path_id: SourcePathId, samples: &[DexSample]) -> Vec<Fill> {
    let side = opts.side;
    let mut fills: Vec<Fill> = Vec::new();
    let mut prev: Option<&DexSample> = None;
    for sample in samples.iter().filter(|s| !s.output.is_zero()) {
        let (prev_input, prev_output) = prev.map(|p| (p.input, p.output)).unwrap_or_default();
        let input = sample.input.saturating_sub(prev_input);
        let output = sample.output.saturating_sub(prev_output);
        prev = Some(sample);
        if input.is_zero() {
            continue;
        }
        // Only the first fill pays for gas
        let penalty = if fills.is_empty() {
            let fee = u256_to_f64(opts.gas_price) * sample.gas_cost as f64;
            eth_to_output_amount(
                u256_to_f64(sample.input),
                u256_to_f64(sample.output),
                opts.input_amount_per_eth,
                opts.output_amount_per_eth,
                fee,
            )
        } else {
            0.0
        };
        let adjusted_output = apply_penalty(side, u256_to_f64(output), penalty);
        fills.push(Fill {
            source_path_id,
            source: sample.source,
            order_type: FillOrderType::Bridge,
            input,
            output,
            adjusted_output,
            adjusted_rate: get_rate(side, u256_to_f64(input), adjusted_output),
            gas_cost: sample.gas_cost,
            flags: sample.source.flag(),
            index: fills.len(),
            native_order: None,
        });
    }
    fills
}

/// Keeps fills until their summed input reaches `target_input`.
pub fn clip_fills_to_input(fills: Vec<Fill>, target_input: U256) -> Vec<Fill> {
    let mut clipped = Vec::with_capacity(fills.len());
    let mut input = U256::ZERO;
    for fill in fills {
        if input >= target_input {
            break;
        }
        input += fill.input;
        clipped.push(fill);
    }
    clipped
}

pub fn has_liquidity(fills: &[Fill]) -> bool {
    if fills.is_empty() {
        return false;
    }
    let total_input = fills.iter().fold(U256::ZERO, |acc, f| acc + f.input);
    let total_output = fills.iter().fold(U256::ZERO, |acc, f| acc + f.output);
    !total_input.is_zero() && !total_output.is_zero()
}
