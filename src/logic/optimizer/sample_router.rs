use super::FillOptimizer;
use crate::logic::config::FillOptimizerKind;
use crate::logic::fills::{CreateFillsOpts, Fill, NATIVE_SOURCE_PATH_ID, SourcePathId, create_fills};
use crate::logic::path::{Path, PathPenaltyOpts, eth_to_output_amount};
use crate::logic::types::{DexSample, FillOrderType, LiquiditySource, MarketOperation, NativeOrderWithFillableAmounts};
use crate::utils::{mul_div, mul_div_ceil, u256_to_f64};
use alloy_primitives::U256;
use tracing::debug;

/// Piecewise linear liquidity curve of one source, starting at the origin.
#[derive(Debug, Clone)]
struct LiquidityCurve {
    source_path_id: SourcePathId,
    source: LiquiditySource,
    gas_cost: u64,
    // (input, output), increasing input
    points: Vec<(f64, f64)>,
    // same points in base units, for the amounts handed out
    exact_points: Vec<(U256, U256)>,
    // paid by the first increment routed to this curve
    penalty: f64,
}

impl LiquidityCurve {
    fn max_input(&self) -> f64 {
        self.points.last().map(|(input, _)| *input).unwrap_or(0.0)
    }

    fn output_at(&self, input: f64) -> f64 {
        let mut prev = (0.0, 0.0);
        for &(x, y) in self.points.iter() {
            if input <= x {
                if x == prev.0 {
                    return y;
                }
                return prev.1 + (y - prev.1) * (input - prev.0) / (x - prev.0);
            }
            prev = (x, y);
        }
        prev.1
    }

    /// Integer interpolation, rounded down for sells and up for buys.
    fn exact_output_at(&self, side: MarketOperation, input: U256) -> U256 {
        let mut prev = (U256::ZERO, U256::ZERO);
        for &(x, y) in self.exact_points.iter() {
            if input <= x {
                if x == prev.0 {
                    return y;
                }
                let (dy, dx, di) = (y.saturating_sub(prev.1), x - prev.0, input - prev.0);
                let delta = match side {
                    MarketOperation::Sell => mul_div(dy, di, dx),
                    MarketOperation::Buy => mul_div_ceil(dy, di, dx),
                };
                return prev.1 + delta;
            }
            prev = (x, y);
        }
        prev.1
    }
}

/// Splits the target into equal increments and hands each one to the source with the
/// best marginal adjusted output, one fill per used source.
#[derive(Debug, Clone)]
pub struct SampleRouterOptimizer {
    steps: usize,
}

impl SampleRouterOptimizer {
    pub fn new(steps: usize) -> Self {
        Self { steps: steps.max(1) }
    }

    fn dex_curves(&self, dex_quotes: &[Vec<DexSample>], penalty_opts: &PathPenaltyOpts) -> Vec<LiquidityCurve> {
        let gas_price = u256_to_f64(penalty_opts.gas_price);
        dex_quotes
            .iter()
            .enumerate()
            .filter_map(|(source_path_id, samples)| {
                let samples: Vec<&DexSample> = samples.iter().filter(|s| !s.output.is_zero() && !s.input.is_zero()).collect();
                let first = samples.first()?;
                let penalty = eth_to_output_amount(
                    u256_to_f64(first.input),
                    u256_to_f64(first.output),
                    penalty_opts.input_amount_per_eth,
                    penalty_opts.output_amount_per_eth,
                    gas_price * first.gas_cost as f64,
                );
                Some(LiquidityCurve {
                    source_path_id,
                    source: first.source,
                    gas_cost: first.gas_cost,
                    points: samples.iter().map(|s| (u256_to_f64(s.input), u256_to_f64(s.output))).collect(),
                    exact_points: samples.iter().map(|s| (s.input, s.output)).collect(),
                    penalty,
                })
            })
            .collect()
    }

    /// The native book as one curve. Order penalties are spread over each order.
    fn native_curve(native_fills: &[Fill]) -> Option<LiquidityCurve> {
        if native_fills.is_empty() {
            return None;
        }
        let mut points = Vec::with_capacity(native_fills.len());
        let mut exact_points = Vec::with_capacity(native_fills.len());
        let (mut input, mut output) = (0.0, 0.0);
        let (mut exact_input, mut exact_output) = (U256::ZERO, U256::ZERO);
        for fill in native_fills {
            input += u256_to_f64(fill.input);
            output += fill.adjusted_output;
            points.push((input, output));
            exact_input += fill.input;
            exact_output += fill.output;
            exact_points.push((exact_input, exact_output));
        }
        Some(LiquidityCurve {
            source_path_id: NATIVE_SOURCE_PATH_ID,
            source: LiquiditySource::Native,
            gas_cost: 0,
            points,
            exact_points,
            penalty: 0.0,
        })
    }

    fn step_sizes(&self, target_input: U256) -> Vec<U256> {
        let steps = U256::from(self.steps);
        let step = target_input / steps;
        if step.is_zero() {
            return vec![target_input];
        }
        let mut sizes = vec![step; self.steps];
        if let Some(last) = sizes.last_mut() {
            *last += target_input - step * steps;
        }
        sizes
    }

    /// Input allocated to each curve, `None` when the curves cannot absorb the target.
    fn allocate(&self, side: MarketOperation, curves: &[LiquidityCurve], target_input: U256) -> Option<Vec<U256>> {
        let mut allocations = vec![U256::ZERO; curves.len()];
        for size in self.step_sizes(target_input) {
            let size_f = u256_to_f64(size);
            let mut best: Option<(usize, f64)> = None;
            for (idx, curve) in curves.iter().enumerate() {
                let allocated = u256_to_f64(allocations[idx]);
                if allocated + size_f > curve.max_input() {
                    continue;
                }
                let penalty = if allocations[idx].is_zero() { curve.penalty } else { 0.0 };
                let delta = curve.output_at(allocated + size_f) - curve.output_at(allocated);
                let score = match side {
                    MarketOperation::Sell => delta - penalty,
                    // output is what the taker pays
                    MarketOperation::Buy => -(delta + penalty),
                };
                if best.is_none_or(|(_, best_score)| score > best_score) {
                    best = Some((idx, score));
                }
            }
            let (idx, _) = best?;
            allocations[idx] += size;
        }
        Some(allocations)
    }

    fn dex_fill(&self, side: MarketOperation, curve: &LiquidityCurve, input: U256) -> Fill {
        let output = curve.exact_output_at(side, input);
        let adjusted_output = match side {
            MarketOperation::Sell => u256_to_f64(output) - curve.penalty,
            MarketOperation::Buy => u256_to_f64(output) + curve.penalty,
        };
        Fill {
            source_path_id: curve.source_path_id,
            source: curve.source,
            order_type: FillOrderType::Bridge,
            input,
            output,
            adjusted_output,
            adjusted_rate: crate::logic::path::get_rate(side, u256_to_f64(input), adjusted_output),
            gas_cost: curve.gas_cost,
            flags: curve.source.flag(),
            index: 0,
            native_order: None,
        }
    }

    /// Native fills covering `input`, the last one cut down to what is left.
    fn native_fills_for(native_fills: &[Fill], input: U256) -> Vec<Fill> {
        let mut result = Vec::new();
        let mut remaining = input;
        for fill in native_fills {
            if remaining.is_zero() {
                break;
            }
            if fill.input <= remaining {
                remaining -= fill.input;
                result.push(fill.clone());
                continue;
            }
            let output = mul_div(fill.output, remaining, fill.input);
            let penalty = fill.adjusted_output - u256_to_f64(fill.output);
            let mut partial = fill.clone();
            partial.input = remaining;
            partial.output = output;
            partial.adjusted_output = u256_to_f64(output) + penalty;
            result.push(partial);
            remaining = U256::ZERO;
        }
        result
    }
}

impl FillOptimizer for SampleRouterOptimizer {
    fn kind(&self) -> FillOptimizerKind {
        FillOptimizerKind::SampleRouter
    }

    fn find_optimal_path(
        &self,
        side: MarketOperation,
        dex_quotes: &[Vec<DexSample>],
        native_orders: &[NativeOrderWithFillableAmounts],
        target_input: U256,
        penalty_opts: &PathPenaltyOpts,
    ) -> Option<Path> {
        if target_input.is_zero() {
            return None;
        }
        let native_fills: Vec<Fill> = create_fills(CreateFillsOpts {
            side,
            orders: native_orders,
            dex_quotes: &[],
            target_input,
            output_amount_per_eth: penalty_opts.output_amount_per_eth,
            input_amount_per_eth: penalty_opts.input_amount_per_eth,
            gas_price: penalty_opts.gas_price,
        })
        .into_iter()
        .flatten()
        .collect();

        let mut curves: Vec<LiquidityCurve> = Self::native_curve(&native_fills).into_iter().collect();
        curves.extend(self.dex_curves(dex_quotes, penalty_opts));

        let Some(allocations) = self.allocate(side, &curves, target_input) else {
            debug!(%target_input, curves = curves.len(), "Sample router could not absorb the target");
            return None;
        };

        let mut fills = Vec::new();
        for (curve, input) in curves.iter().zip(allocations) {
            if input.is_zero() {
                continue;
            }
            if curve.source_path_id == NATIVE_SOURCE_PATH_ID {
                fills.extend(Self::native_fills_for(&native_fills, input));
            } else {
                fills.push(self.dex_fill(side, curve, input));
            }
        }

        let path = Path::create(side, fills, target_input, penalty_opts.clone());
        if path.is_complete() { Some(path) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::types::NativeOrder;
    use alloy_primitives::Address;

    fn curve(source: LiquiditySource, points: &[(u64, u64)]) -> Vec<DexSample> {
        points.iter().map(|(i, o)| DexSample::new(source, U256::from(*i), U256::from(*o))).collect()
    }

    #[test]
    fn test_single_source() {
        let quotes = vec![curve(LiquiditySource::UniswapV3, &[(50, 49), (100, 98)])];
        let path = SampleRouterOptimizer::new(4)
            .find_optimal_path(MarketOperation::Sell, &quotes, &[], U256::from(100u64), &PathPenaltyOpts::default())
            .expect("path");
        assert_eq!(path.fills.len(), 1);
        assert_eq!(path.size().output, U256::from(98u64));
    }

    #[test]
    fn test_splits_between_concave_curves() {
        let quotes = vec![
            curve(LiquiditySource::UniswapV2, &[(50, 50), (100, 60)]),
            curve(LiquiditySource::SushiSwap, &[(50, 49), (100, 59)]),
        ];
        let path = SampleRouterOptimizer::new(2)
            .find_optimal_path(MarketOperation::Sell, &quotes, &[], U256::from(100u64), &PathPenaltyOpts::default())
            .expect("path");
        assert_eq!(path.fills.len(), 2);
        assert_eq!(path.size().output, U256::from(99u64));
    }

    #[test]
    fn test_not_enough_liquidity() {
        let quotes = vec![curve(LiquiditySource::UniswapV2, &[(50, 50)])];
        let path = SampleRouterOptimizer::new(8).find_optimal_path(
            MarketOperation::Sell,
            &quotes,
            &[],
            U256::from(100u64),
            &PathPenaltyOpts::default(),
        );
        assert!(path.is_none());
    }

    #[test]
    fn test_native_orders_are_used_first_when_cheaper() {
        let (maker, taker) = (Address::repeat_byte(1), Address::repeat_byte(2));
        let orders = vec![NativeOrderWithFillableAmounts::from_taker_amount(
            NativeOrder::new_rfq(maker, taker, U256::from(110u64), U256::from(100u64)),
            U256::from(100u64),
        )];
        let quotes = vec![curve(LiquiditySource::Curve, &[(100, 90)])];
        let path = SampleRouterOptimizer::new(4)
            .find_optimal_path(MarketOperation::Sell, &quotes, &orders, U256::from(100u64), &PathPenaltyOpts::default())
            .expect("path");
        assert!(path.fills.iter().all(|f| f.source == LiquiditySource::Native));
        assert_eq!(path.size().output, U256::from(110u64));
        assert!(path.fills[0].native_order.is_some());
    }

    #[test]
    fn test_18_decimal_output_is_exact() {
        let (input, output) = (1_000_000_000_000_000_000u64, 1_000_000_000_000_000_100u64);
        let quotes = vec![curve(LiquiditySource::Curve, &[(input, output)])];
        let path = SampleRouterOptimizer::new(4)
            .find_optimal_path(MarketOperation::Sell, &quotes, &[], U256::from(input), &PathPenaltyOpts::default())
            .expect("path");
        assert_eq!(path.size().output, U256::from(output));
        let orders = path.collapse(Address::repeat_byte(1), Address::repeat_byte(2), 0.0);
        assert_eq!(orders[0].maker_amount, U256::from(output));
    }

    #[test]
    fn test_interpolation_rounds_against_the_taker() {
        let router = SampleRouterOptimizer::new(1);
        let quotes = vec![curve(LiquiditySource::Curve, &[(2, 3)])];
        let curves = router.dex_curves(&quotes, &PathPenaltyOpts::default());
        assert_eq!(curves[0].exact_output_at(MarketOperation::Sell, U256::from(1u64)), U256::from(1u64));
        assert_eq!(curves[0].exact_output_at(MarketOperation::Buy, U256::from(1u64)), U256::from(2u64));
        assert_eq!(curves[0].exact_output_at(MarketOperation::Sell, U256::from(5u64)), U256::from(3u64));
    }

    #[test]
    fn test_step_sizes_sum_to_target() {
        let router = SampleRouterOptimizer::new(3);
        let sizes = router.step_sizes(U256::from(10u64));
        assert_eq!(sizes, vec![U256::from(3u64), U256::from(3u64), U256::from(4u64)]);
        assert_eq!(router.step_sizes(U256::from(2u64)), vec![U256::from(2u64)]);
    }
}
