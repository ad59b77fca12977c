use alloy_primitives::Address;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use swap_optimizer::logic::{Pathfinder, TokenAdjacencyGraph};
use swap_optimizer::utils::{MainnetTokenAddress, WETH};

fn benchmark_intermediate_token_paths(c: &mut Criterion) {
    let mut adjacency = TokenAdjacencyGraph::for_chain(1);
    let taker_token = Address::repeat_byte(1);
    let maker_token = Address::repeat_byte(2);
    adjacency.add_adjacent(taker_token, &[WETH, MainnetTokenAddress::USDC, MainnetTokenAddress::DAI]);
    adjacency.add_adjacent(maker_token, &[WETH, MainnetTokenAddress::USDT, MainnetTokenAddress::WBTC]);

    let pathfinder = Pathfinder::new(3);

    c.bench_function("intermediate_token_paths", |b| {
        b.iter(|| pathfinder.intermediate_token_paths(black_box(&adjacency), black_box(taker_token), black_box(maker_token)))
    });
}

criterion_group!(benches, benchmark_intermediate_token_paths);
criterion_main!(benches);
