use alloy_primitives::{Address, U256};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use swap_optimizer::logic::{BoundedSearchOptimizer, HopOptimizer, HopRouteSearch, QuoteGraph};
use swap_optimizer::logic::{DexSample, HopQuotes, LiquiditySource, MarketOperation, TokenAmountPerEth};

fn linear(source: LiquiditySource, rate_pct: u64) -> Vec<DexSample> {
    (1..=13u64).map(|i| i * 100).map(|i| DexSample::new(source, U256::from(i), U256::from(i * rate_pct / 100))).collect()
}

fn benchmark_find_best_optimized_hop_route(c: &mut Criterion) {
    let taker_token = Address::repeat_byte(1);
    let maker_token = Address::repeat_byte(2);
    let bridges = [Address::repeat_byte(3), Address::repeat_byte(4)];

    let mut edges = vec![
        HopQuotes::new(taker_token, maker_token)
            .with_dex_quotes(vec![linear(LiquiditySource::UniswapV2, 90), linear(LiquiditySource::SushiSwap, 91)]),
    ];
    for bridge in bridges {
        edges.push(HopQuotes::new(taker_token, bridge).with_dex_quotes(vec![linear(LiquiditySource::UniswapV3, 99)]));
        edges.push(HopQuotes::new(bridge, maker_token).with_dex_quotes(vec![linear(LiquiditySource::Curve, 95)]));
    }
    let graph = QuoteGraph::new(edges);
    let token_amount_per_eth = TokenAmountPerEth::new();

    let hop_optimizer = HopOptimizer::new(Arc::new(BoundedSearchOptimizer::new(1 << 15)));
    let search = HopRouteSearch::new(hop_optimizer, false);

    c.bench_function("find_best_optimized_hop_route", |b| {
        b.iter(|| {
            search.find_best_optimized_hop_route(
                black_box(MarketOperation::Sell),
                black_box(taker_token),
                black_box(maker_token),
                black_box(U256::from(1_000u64)),
                black_box(&graph),
                black_box(&token_amount_per_eth),
            )
        })
    });
}

criterion_group!(benches, benchmark_find_best_optimized_hop_route);
criterion_main!(benches);
