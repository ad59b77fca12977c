use super::path::eth_to_output_amount;
use super::types::{LiquiditySource, MarketOperation, MarketSideLiquidity};
use crate::utils::constants::LIMIT_ORDER_GAS;
use crate::utils::u256_to_f64;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPrice {
    /// Maker unit amount per taker unit amount for the whole order
    pub whole_order: Option<f64>,
}

/// Whole-order price implied by an adjusted rate, with the cost of filling a native
/// order added back so that makers are compared on an equal footing.
pub fn get_comparison_prices(adjusted_rate: f64, amount: U256, market_side_liquidity: &MarketSideLiquidity, gas_price: U256) -> ComparisonPrice {
    if adjusted_rate <= 0.0 || !adjusted_rate.is_finite() {
        return ComparisonPrice::default();
    }

    let fee_in_eth = if market_side_liquidity.quote_source_filters.is_allowed(LiquiditySource::Native) {
        u256_to_f64(gas_price) * LIMIT_ORDER_GAS as f64
    } else {
        0.0
    };

    let amount = u256_to_f64(amount);
    let side = market_side_liquidity.side;
    // the adjusted rate is maker per taker on both sides
    let output = match side {
        MarketOperation::Sell => amount * adjusted_rate,
        MarketOperation::Buy => amount / adjusted_rate,
    };
    let fee_penalty = eth_to_output_amount(
        amount,
        output,
        market_side_liquidity.amount_per_eth(market_side_liquidity.input_token),
        market_side_liquidity.amount_per_eth(market_side_liquidity.output_token),
        fee_in_eth,
    );

    let (order_maker_amount, order_taker_amount) = match side {
        MarketOperation::Sell => (output + fee_penalty, amount),
        MarketOperation::Buy => (amount, output - fee_penalty),
    };
    if order_maker_amount <= 0.0 || order_taker_amount <= 0.0 {
        warn!(order_maker_amount, order_taker_amount, "Invalid comparison price amounts");
        return ComparisonPrice::default();
    }

    let maker_unit_amount = order_maker_amount.floor() / 10f64.powi(market_side_liquidity.maker_token_decimals as i32);
    let taker_unit_amount = order_taker_amount.ceil() / 10f64.powi(market_side_liquidity.taker_token_decimals as i32);
    ComparisonPrice { whole_order: Some(maker_unit_amount / taker_unit_amount) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::graph::QuoteGraph;
    use crate::logic::source_filters::SourceFilters;
    use crate::logic::types::TokenAmountPerEth;
    use alloy_primitives::Address;

    fn liquidity(side: MarketOperation, filters: SourceFilters, output_per_eth: f64) -> MarketSideLiquidity {
        let (input_token, output_token) = (Address::repeat_byte(1), Address::repeat_byte(2));
        let mut token_amount_per_eth = TokenAmountPerEth::new();
        token_amount_per_eth.insert(output_token, output_per_eth);
        MarketSideLiquidity {
            side,
            input_amount: U256::from(1_000_000u64),
            input_token,
            output_token,
            token_amount_per_eth,
            quote_source_filters: filters,
            maker_token_decimals: 6,
            taker_token_decimals: 6,
            gas_price: U256::ZERO,
            quotes: QuoteGraph::default(),
            is_rfq_supported: false,
        }
    }

    #[test]
    fn test_sell_without_native_fee() {
        let msl = liquidity(MarketOperation::Sell, SourceFilters::default().exclude(&[LiquiditySource::Native]), 1.0);
        let price = get_comparison_prices(0.5, U256::from(1_000_000u64), &msl, U256::from(1u64));
        assert_eq!(price.whole_order, Some(0.5));
    }

    #[test]
    fn test_sell_adds_back_native_fee() {
        let msl = liquidity(MarketOperation::Sell, SourceFilters::default(), 1.0);
        // fee 135_000 wei at 1 output per wei
        let price = get_comparison_prices(0.5, U256::from(1_000_000u64), &msl, U256::from(1u64));
        assert_eq!(price.whole_order, Some(0.635));
    }

    #[test]
    fn test_buy_price() {
        let msl = liquidity(MarketOperation::Buy, SourceFilters::default(), 0.0);
        let price = get_comparison_prices(0.5, U256::from(1_000_000u64), &msl, U256::ZERO);
        assert_eq!(price.whole_order, Some(0.5));
    }

    #[test]
    fn test_non_positive_rate() {
        let msl = liquidity(MarketOperation::Sell, SourceFilters::default(), 1.0);
        assert_eq!(get_comparison_prices(0.0, U256::from(1u64), &msl, U256::ZERO).whole_order, None);
    }
}
