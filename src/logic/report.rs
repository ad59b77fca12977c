use super::comparison_price::ComparisonPrice;
use super::types::{
    DexSample, FillOrderType, LiquiditySource, MarketOperation, MarketSideLiquidity, NativeOrderType, NativeOrderWithFillableAmounts,
    OptimizedHop, OptimizerResult,
};
use alloy_primitives::{Address, U256};
use serde::Serialize;

/// One delivered order of the final route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteReportEntry {
    pub source: LiquiditySource,
    pub order_type: FillOrderType,
    pub maker_token: Address,
    pub taker_token: Address,
    pub maker_amount: U256,
    pub taker_amount: U256,
    pub fill_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteReportHop {
    pub input_token: Address,
    pub output_token: Address,
    pub input_amount: U256,
    pub output_amount: U256,
    pub orders: Vec<QuoteReportEntry>,
}

/// Liquidity delivered by the chosen route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteReport {
    pub side: MarketOperation,
    pub hops: Vec<QuoteReportHop>,
    pub comparison_price: Option<f64>,
}

/// A DEX source quoted on some edge, at the largest amount sampled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DexReportEntry {
    pub source: LiquiditySource,
    pub maker_amount: U256,
    pub taker_amount: U256,
}

/// A DEX source quoted on an edge of a multi-hop route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiHopReportEntry {
    pub source: LiquiditySource,
    pub input_token: Address,
    pub output_token: Address,
    pub input_amount: U256,
    pub output_amount: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeReportEntry {
    pub order_type: NativeOrderType,
    pub maker_amount: U256,
    pub taker_amount: U256,
    pub fillable_taker_amount: U256,
    pub is_rfqt: bool,
    pub comparison_price: Option<f64>,
}

/// All liquidity seen for a request, for comparing against the chosen route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceComparisonsReport {
    pub dex_sources: Vec<DexReportEntry>,
    pub multi_hop_sources: Vec<MultiHopReportEntry>,
    pub native_sources: Vec<NativeReportEntry>,
}

#[derive(Debug, Clone)]
pub struct OptimizerResultWithReport {
    pub result: OptimizerResult,
    pub quote_report: Option<QuoteReport>,
    pub price_comparisons_report: Option<PriceComparisonsReport>,
}

impl From<OptimizerResult> for OptimizerResultWithReport {
    fn from(result: OptimizerResult) -> Self {
        Self { result, quote_report: None, price_comparisons_report: None }
    }
}

pub fn generate_quote_report(side: MarketOperation, hops: &[OptimizedHop], comparison_price: ComparisonPrice) -> QuoteReport {
    let hops = hops
        .iter()
        .map(|hop| QuoteReportHop {
            input_token: hop.input_token,
            output_token: hop.output_token,
            input_amount: hop.input_amount,
            output_amount: hop.output_amount,
            orders: hop
                .orders
                .iter()
                .map(|order| QuoteReportEntry {
                    source: order.source,
                    order_type: order.order_type,
                    maker_token: order.maker_token,
                    taker_token: order.taker_token,
                    maker_amount: order.maker_amount,
                    taker_amount: order.taker_amount,
                    fill_count: order.fill_count,
                })
                .collect(),
        })
        .collect();
    QuoteReport { side, hops, comparison_price: comparison_price.whole_order }
}

fn largest_sample(samples: &[DexSample]) -> Option<&DexSample> {
    samples.iter().filter(|s| !s.output.is_zero()).max_by_key(|s| s.input)
}

fn native_report_entry(order: &NativeOrderWithFillableAmounts, comparison_price: ComparisonPrice) -> NativeReportEntry {
    NativeReportEntry {
        order_type: order.order.order_type,
        maker_amount: order.order.maker_amount,
        taker_amount: order.order.taker_amount,
        fillable_taker_amount: order.fillable_taker_amount,
        is_rfqt: order.order.order_type == NativeOrderType::Rfq,
        comparison_price: comparison_price.whole_order,
    }
}

pub fn generate_price_comparisons_report(market_side_liquidity: &MarketSideLiquidity, comparison_price: ComparisonPrice) -> PriceComparisonsReport {
    let side = market_side_liquidity.side;
    let mut dex_sources = Vec::new();
    let mut multi_hop_sources = Vec::new();
    let mut native_sources = Vec::new();

    for edge in market_side_liquidity.quotes.edges() {
        let is_direct = edge.connects(market_side_liquidity.input_token, market_side_liquidity.output_token);
        for sample in edge.dex_quotes.iter().filter_map(|samples| largest_sample(samples)) {
            if is_direct {
                let (maker_amount, taker_amount) = match side {
                    MarketOperation::Sell => (sample.output, sample.input),
                    MarketOperation::Buy => (sample.input, sample.output),
                };
                dex_sources.push(DexReportEntry { source: sample.source, maker_amount, taker_amount });
            } else {
                multi_hop_sources.push(MultiHopReportEntry {
                    source: sample.source,
                    input_token: edge.input_token,
                    output_token: edge.output_token,
                    input_amount: sample.input,
                    output_amount: sample.output,
                });
            }
        }
        native_sources.extend(edge.native_orders.iter().map(|order| native_report_entry(order, comparison_price)));
    }

    PriceComparisonsReport { dex_sources, multi_hop_sources, native_sources }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::graph::QuoteGraph;
    use crate::logic::source_filters::SourceFilters;
    use crate::logic::types::{HopQuotes, NativeOrder, TokenAmountPerEth};

    fn token(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[test]
    fn test_price_comparisons_report() {
        let rfq = NativeOrderWithFillableAmounts::from_taker_amount(
            NativeOrder::new_rfq(token(2), token(1), U256::from(99u64), U256::from(100u64)),
            U256::from(100u64),
        );
        let quotes = QuoteGraph::new(vec![
            HopQuotes::new(token(1), token(2))
                .with_dex_quotes(vec![vec![
                    DexSample::new(LiquiditySource::UniswapV2, U256::from(50u64), U256::from(49u64)),
                    DexSample::new(LiquiditySource::UniswapV2, U256::from(100u64), U256::from(97u64)),
                ]])
                .with_native_orders(vec![rfq]),
            HopQuotes::new(token(1), token(3))
                .with_dex_quotes(vec![vec![DexSample::new(LiquiditySource::Curve, U256::from(100u64), U256::from(200u64))]]),
        ]);
        let msl = MarketSideLiquidity {
            side: MarketOperation::Sell,
            input_amount: U256::from(100u64),
            input_token: token(1),
            output_token: token(2),
            token_amount_per_eth: TokenAmountPerEth::new(),
            quote_source_filters: SourceFilters::default(),
            maker_token_decimals: 18,
            taker_token_decimals: 18,
            gas_price: U256::ZERO,
            quotes,
            is_rfq_supported: true,
        };

        let report = generate_price_comparisons_report(&msl, ComparisonPrice { whole_order: Some(0.97) });
        assert_eq!(
            report.dex_sources,
            vec![DexReportEntry { source: LiquiditySource::UniswapV2, maker_amount: U256::from(97u64), taker_amount: U256::from(100u64) }]
        );
        assert_eq!(report.multi_hop_sources.len(), 1);
        assert_eq!(report.multi_hop_sources[0].output_token, token(3));
        assert_eq!(report.native_sources.len(), 1);
        assert!(report.native_sources[0].is_rfqt);
        assert_eq!(report.native_sources[0].comparison_price, Some(0.97));
    }

    #[test]
    fn test_quote_report_serializes() -> eyre::Result<()> {
        let report = generate_quote_report(MarketOperation::Sell, &[], ComparisonPrice::default());
        let json = serde_json::to_value(&report)?;
        assert_eq!(json["side"], "SELL");
        assert!(json["hops"].as_array().is_some_and(|hops| hops.is_empty()));
        Ok(())
    }
}
