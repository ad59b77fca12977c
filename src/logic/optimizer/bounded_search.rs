use super::FillOptimizer;
use crate::logic::config::FillOptimizerKind;
use crate::logic::fills::{CreateFillsOpts, Fill, SourcePathId, create_fills};
use crate::logic::path::{Path, PathPenaltyOpts};
use crate::logic::types::{DexSample, MarketOperation, NativeOrderWithFillableAmounts};
use alloy_primitives::U256;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

const RUN_LIMIT_DECAY_FACTOR: f64 = 0.5;
const MIN_MIX_STEPS: usize = 32;

/// Mixes per-source fill paths pairwise with a depth-first walk whose step count is
/// capped by a decaying run limit.
#[derive(Debug, Clone)]
pub struct BoundedSearchOptimizer {
    run_limit: usize,
}

impl BoundedSearchOptimizer {
    pub fn new(run_limit: usize) -> Self {
        Self { run_limit }
    }

    pub fn find_optimal_path_from_fills(
        &self,
        side: MarketOperation,
        fills: Vec<Vec<Fill>>,
        target_input: U256,
        penalty_opts: &PathPenaltyOpts,
    ) -> Option<Path> {
        let sorted_paths = reduce_paths(fills_to_sorted_paths(fills, side, target_input, penalty_opts));
        let rates = rate_by_source_path_id(&sorted_paths);

        let mut paths = sorted_paths.into_iter();
        let mut optimal_path = paths.next()?;
        for (i, path) in paths.enumerate() {
            let max_steps = self.run_limit as f64 * RUN_LIMIT_DECAY_FACTOR.powi(i as i32);
            optimal_path = mix_paths(side, optimal_path, path, target_input, max_steps as usize, &rates);
        }
        if optimal_path.is_complete() { Some(optimal_path) } else { None }
    }
}

impl FillOptimizer for BoundedSearchOptimizer {
    fn kind(&self) -> FillOptimizerKind {
        FillOptimizerKind::BoundedSearch
    }

    fn find_optimal_path(
        &self,
        side: MarketOperation,
        dex_quotes: &[Vec<DexSample>],
        native_orders: &[NativeOrderWithFillableAmounts],
        target_input: U256,
        penalty_opts: &PathPenaltyOpts,
    ) -> Option<Path> {
        let fills = create_fills(CreateFillsOpts {
            side,
            orders: native_orders,
            dex_quotes,
            target_input,
            output_amount_per_eth: penalty_opts.output_amount_per_eth,
            input_amount_per_eth: penalty_opts.input_amount_per_eth,
            gas_price: penalty_opts.gas_price,
        });
        self.find_optimal_path_from_fills(side, fills, target_input, penalty_opts)
    }
}

fn cmp_rate_desc(a: f64, b: f64) -> Ordering {
    // NaN sorts last
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// One single-source path per fill chain, best adjusted complete rate first.
pub fn fills_to_sorted_paths(fills: Vec<Vec<Fill>>, side: MarketOperation, target_input: U256, penalty_opts: &PathPenaltyOpts) -> Vec<Path> {
    let mut paths: Vec<(f64, Path)> = fills
        .into_iter()
        .map(|chain| {
            let path = Path::create(side, chain, target_input, penalty_opts.clone());
            (path.adjusted_complete_rate(), path)
        })
        .collect();
    paths.sort_by(|(a, _), (b, _)| cmp_rate_desc(*a, *b));
    paths.into_iter().map(|(_, path)| path).collect()
}

/// Drops paths that cannot improve on a complete best path: their best fill rate is
/// below the best path's adjusted complete rate.
pub fn reduce_paths(sorted_paths: Vec<Path>) -> Vec<Path> {
    let Some(best_path) = sorted_paths.first() else {
        return sorted_paths;
    };
    if !best_path.is_complete() {
        return sorted_paths;
    }
    let best_rate = best_path.adjusted_complete_rate();
    sorted_paths.into_iter().filter(|p| p.best_rate() >= best_rate).collect()
}

fn rate_by_source_path_id(paths: &[Path]) -> HashMap<SourcePathId, f64> {
    paths.iter().filter_map(|p| p.fills.first().map(|f| (f.source_path_id, p.adjusted_rate()))).collect()
}

/// Pending branch of the walk.
struct WalkFrame {
    path: Path,
    remaining: Vec<usize>,
    next: usize,
}

fn mix_paths(
    side: MarketOperation,
    path_a: Path,
    path_b: Path,
    target_input: U256,
    max_steps: usize,
    rates: &HashMap<SourcePathId, f64>,
) -> Path {
    let max_steps = max_steps.max(MIN_MIX_STEPS);

    // Keep fills of one source contiguous and in chain order, best sources first
    let mut all_fills: Vec<Fill> = path_a.fills.iter().chain(path_b.fills.iter()).cloned().collect();
    all_fills.sort_by(|a, b| {
        if a.source_path_id != b.source_path_id {
            let rate_a = rates.get(&a.source_path_id).copied().unwrap_or(0.0);
            let rate_b = rates.get(&b.source_path_id).copied().unwrap_or(0.0);
            return cmp_rate_desc(rate_a, rate_b);
        }
        a.index.cmp(&b.index)
    });

    let penalty_opts = path_a.penalty_opts.clone();
    let mut best_path = path_a;
    let mut steps = 0usize;

    let mut visit = |path: Path, remaining: Vec<usize>, stack: &mut Vec<WalkFrame>, steps: &mut usize| {
        *steps += 1;
        if path.is_better_than(&best_path) {
            best_path = path.clone();
        }
        if path.size().input < target_input {
            stack.push(WalkFrame { path, remaining, next: 0 });
        }
    };

    let mut stack: Vec<WalkFrame> = Vec::new();
    visit(Path::create(side, vec![], target_input, penalty_opts), (0..all_fills.len()).collect(), &mut stack, &mut steps);

    while let Some(frame) = stack.last_mut() {
        let mut child = None;
        while frame.next < frame.remaining.len() && steps < max_steps {
            let i = frame.next;
            frame.next += 1;
            let fill = &all_fills[frame.remaining[i]];
            if !frame.path.is_valid_next_fill(fill) {
                continue;
            }
            let mut next_remaining = frame.remaining.clone();
            next_remaining.remove(i);
            let mut next_path = frame.path.clone();
            next_path.append(fill.clone());
            child = Some((next_path, next_remaining));
            break;
        }
        match child {
            Some((path, remaining)) => visit(path, remaining, &mut stack, &mut steps),
            None => {
                stack.pop();
            }
        }
    }

    debug!(steps, max_steps, fills = best_path.fills.len(), "Mixed fill paths");
    best_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::types::{LiquiditySource, NativeOrder};
    use alloy_primitives::Address;

    fn curve(source: LiquiditySource, points: &[(u64, u64)]) -> Vec<DexSample> {
        points.iter().map(|(i, o)| DexSample::new(source, U256::from(*i), U256::from(*o))).collect()
    }

    #[test]
    fn test_single_source() {
        let quotes = vec![curve(LiquiditySource::UniswapV2, &[(100, 98)])];
        let path = BoundedSearchOptimizer::new(1 << 15)
            .find_optimal_path(MarketOperation::Sell, &quotes, &[], U256::from(100u64), &PathPenaltyOpts::default())
            .expect("path");
        assert_eq!(path.fills.len(), 1);
        assert!((path.adjusted_complete_rate() - 0.98).abs() < 1e-12);
    }

    #[test]
    fn test_mixes_sources_with_diminishing_returns() {
        // each source is good for its first half and bad for its second half
        let quotes = vec![
            curve(LiquiditySource::UniswapV2, &[(50, 50), (100, 60)]),
            curve(LiquiditySource::SushiSwap, &[(50, 49), (100, 59)]),
        ];
        let path = BoundedSearchOptimizer::new(1 << 15)
            .find_optimal_path(MarketOperation::Sell, &quotes, &[], U256::from(100u64), &PathPenaltyOpts::default())
            .expect("path");
        assert_eq!(path.size().output, U256::from(99u64));
        assert_eq!(path.source_flags, LiquiditySource::UniswapV2.flag() | LiquiditySource::SushiSwap.flag());
    }

    #[test]
    fn test_insufficient_liquidity_is_none() {
        let quotes = vec![curve(LiquiditySource::UniswapV2, &[(50, 50)])];
        let path = BoundedSearchOptimizer::new(1 << 15).find_optimal_path(
            MarketOperation::Sell,
            &quotes,
            &[],
            U256::from(100u64),
            &PathPenaltyOpts::default(),
        );
        assert!(path.is_none());
    }

    #[test]
    fn test_native_and_dex_combined() {
        let (maker, taker) = (Address::repeat_byte(1), Address::repeat_byte(2));
        let orders = vec![NativeOrderWithFillableAmounts::from_taker_amount(
            NativeOrder::new_limit(maker, taker, U256::from(60u64), U256::from(50u64)),
            U256::from(50u64),
        )];
        let quotes = vec![curve(LiquiditySource::Curve, &[(50, 45), (100, 90)])];
        let path = BoundedSearchOptimizer::new(1 << 15)
            .find_optimal_path(MarketOperation::Sell, &quotes, &orders, U256::from(100u64), &PathPenaltyOpts::default())
            .expect("path");
        assert_eq!(path.size().output, U256::from(105u64));
        assert_eq!(path.fills[0].source, LiquiditySource::Native);
    }

    #[test]
    fn test_tiny_run_limit_still_walks_minimum_steps() {
        let quotes = vec![
            curve(LiquiditySource::UniswapV2, &[(50, 50), (100, 60)]),
            curve(LiquiditySource::SushiSwap, &[(50, 49), (100, 59)]),
        ];
        let path = BoundedSearchOptimizer::new(1).find_optimal_path(
            MarketOperation::Sell,
            &quotes,
            &[],
            U256::from(100u64),
            &PathPenaltyOpts::default(),
        );
        assert!(path.is_some());
    }
}
