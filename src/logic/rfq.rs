use super::graph::QuoteGraph;
use super::token_pair::input_output_from_taker_maker;
use super::types::{MarketOperation, NativeOrder, NativeOrderWithFillableAmounts};
use alloy_primitives::U256;
use tracing::debug;

/// Fillable amounts for off-exchange orders: maker side derived from the order's
/// price, no taker fee. A missing taker amount means nothing is fillable.
pub fn rfq_orders_with_fillable_amounts(orders: &[NativeOrder], fillable_taker_amounts: &[U256]) -> Vec<NativeOrderWithFillableAmounts> {
    orders
        .iter()
        .enumerate()
        .map(|(i, order)| {
            let fillable_taker_amount = fillable_taker_amounts.get(i).copied().unwrap_or_default();
            NativeOrderWithFillableAmounts {
                order: order.clone(),
                fillable_taker_amount,
                fillable_maker_amount: order.adjusted_maker_fill_amount(fillable_taker_amount),
                fillable_taker_fee_amount: U256::ZERO,
            }
        })
        .collect()
}

/// New quote graph with `orders` added to the edge they trade on.
///
/// All orders are expected to share the first order's token pair. Sells put them on
/// the taker -> maker edge, buys on maker -> taker. The edge is created if missing.
/// Injecting the same orders twice adds them twice.
pub fn inject_rfq_liquidity(graph: &QuoteGraph, side: MarketOperation, orders: &[NativeOrder], fillable_taker_amounts: &[U256]) -> QuoteGraph {
    let Some(first) = orders.first() else {
        return graph.clone();
    };
    let (input_token, output_token) = input_output_from_taker_maker(side, first.taker_token, first.maker_token);

    let full_orders = rfq_orders_with_fillable_amounts(orders, fillable_taker_amounts);
    debug!(?side, %input_token, %output_token, orders = full_orders.len(), "Injecting RFQ liquidity");
    graph.with_native_orders(input_token, output_token, &full_orders)
}
