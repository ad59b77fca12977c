use super::config::BridgeTieBreak;
use super::token_pair::taker_maker_tokens_from_path;
use super::types::MarketOperation;
use crate::utils::{f64_to_u256_rounded, u256_to_f64};
use alloy_primitives::{Address, U256};
use tracing::debug;

/// Two chained token paths and the amount to sample on each of them.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoHopBridge {
    /// In trade order: taker side first for sells, maker side first for buys
    pub paths: Vec<Vec<Address>>,
    /// Per path, inverted for buys
    pub prices: Vec<f64>,
    pub amounts: Vec<U256>,
}

#[derive(Debug, Clone, Copy)]
pub struct BridgeSelector {
    pub tie_break: BridgeTieBreak,
    /// Over-sampling applied to the amount propagated into the next hop
    pub hop_amount_scaling: f64,
}

impl Default for BridgeSelector {
    fn default() -> Self {
        Self { tie_break: BridgeTieBreak::KeepFirst, hop_amount_scaling: 1.25 }
    }
}

impl BridgeSelector {
    pub fn new(tie_break: BridgeTieBreak, hop_amount_scaling: f64) -> Self {
        Self { tie_break, hop_amount_scaling }
    }

    /// Picks the pair of candidate paths `taker -> t`, `t -> maker` with the highest
    /// product of prices. `prices[i]` is the sell-direction price of `candidates[i]`.
    pub fn select(
        &self,
        side: MarketOperation,
        taker_token: Address,
        maker_token: Address,
        candidates: &[Vec<Address>],
        prices: &[f64],
        input_amount: U256,
    ) -> Option<TwoHopBridge> {
        let mut best: Option<(usize, usize, f64)> = None;

        for (first_idx, first_hop) in candidates.iter().enumerate() {
            let Some((first_taker, first_maker)) = taker_maker_tokens_from_path(first_hop) else {
                continue;
            };
            if first_taker != taker_token {
                continue;
            }
            for (second_idx, second_hop) in candidates.iter().enumerate() {
                if first_idx == second_idx {
                    continue;
                }
                let Some((second_taker, second_maker)) = taker_maker_tokens_from_path(second_hop) else {
                    continue;
                };
                if second_maker != maker_token || first_maker != second_taker {
                    continue;
                }
                let total_price = price_at(prices, first_idx) * price_at(prices, second_idx);
                let replace = match best {
                    None => true,
                    Some((_, _, best_price)) => match self.tie_break {
                        BridgeTieBreak::KeepFirst => total_price > best_price,
                        BridgeTieBreak::KeepLast => total_price >= best_price,
                    },
                };
                if replace {
                    best = Some((first_idx, second_idx, total_price));
                }
            }
        }

        let (first_idx, second_idx, total_price) = best?;
        debug!(?side, first = ?candidates[first_idx], second = ?candidates[second_idx], total_price, "Selected two hop bridge");

        let mut paths = vec![candidates[first_idx].clone(), candidates[second_idx].clone()];
        let mut hop_prices = vec![price_at(prices, first_idx), price_at(prices, second_idx)];
        if side == MarketOperation::Buy {
            // prices were sampled in the sell direction
            paths.reverse();
            hop_prices = hop_prices.into_iter().rev().map(|p| if p == 0.0 { 0.0 } else { 1.0 / p }).collect();
        }

        let mut amounts = vec![input_amount];
        for price in hop_prices.iter().take(hop_prices.len() - 1) {
            let last_amount = amounts.last().copied().unwrap_or_default();
            amounts.push(f64_to_u256_rounded(u256_to_f64(last_amount) * price * self.hop_amount_scaling));
        }

        Some(TwoHopBridge { paths, prices: hop_prices, amounts })
    }
}

fn price_at(prices: &[f64], idx: usize) -> f64 {
    prices.get(idx).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[test]
    fn test_selects_highest_product() {
        let (taker, maker, x, y) = (token(1), token(2), token(3), token(4));
        let candidates = vec![vec![taker, x], vec![x, maker], vec![taker, y], vec![y, maker]];
        let prices = vec![2.0, 1.0, 1.5, 2.0];

        let bridge = BridgeSelector::default()
            .select(MarketOperation::Sell, taker, maker, &candidates, &prices, U256::from(1000u64))
            .expect("bridge");

        assert_eq!(bridge.paths, vec![vec![taker, y], vec![y, maker]]);
        assert_eq!(bridge.prices, vec![1.5, 2.0]);
        // 1000 * 1.5 * 1.25
        assert_eq!(bridge.amounts, vec![U256::from(1000u64), U256::from(1875u64)]);
    }

    #[test]
    fn test_no_compatible_pair() {
        let (taker, maker, x, y) = (token(1), token(2), token(3), token(4));
        let candidates = vec![vec![taker, x], vec![y, maker]];
        let bridge = BridgeSelector::default().select(MarketOperation::Sell, taker, maker, &candidates, &[1.0, 1.0], U256::from(1u64));
        assert!(bridge.is_none());
    }

    #[test]
    fn test_order_independent_without_ties() {
        let (taker, maker, x, y, z) = (token(1), token(2), token(3), token(4), token(5));
        let candidates = vec![vec![taker, x], vec![x, maker], vec![taker, y], vec![y, maker], vec![taker, z], vec![z, maker]];
        let prices = vec![1.0, 1.1, 0.9, 1.3, 1.2, 0.8];

        let selector = BridgeSelector::default();
        let forward = selector.select(MarketOperation::Sell, taker, maker, &candidates, &prices, U256::from(100u64));

        let reversed_candidates: Vec<_> = candidates.iter().rev().cloned().collect();
        let reversed_prices: Vec<_> = prices.iter().rev().copied().collect();
        let backward = selector.select(MarketOperation::Sell, taker, maker, &reversed_candidates, &reversed_prices, U256::from(100u64));

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_tie_break() {
        let (taker, maker, x, y) = (token(1), token(2), token(3), token(4));
        let candidates = vec![vec![taker, x], vec![x, maker], vec![taker, y], vec![y, maker]];
        let prices = vec![1.0, 2.0, 2.0, 1.0];

        let first = BridgeSelector::new(BridgeTieBreak::KeepFirst, 1.25)
            .select(MarketOperation::Sell, taker, maker, &candidates, &prices, U256::from(1u64))
            .expect("bridge");
        assert_eq!(first.paths[0], vec![taker, x]);

        let last = BridgeSelector::new(BridgeTieBreak::KeepLast, 1.25)
            .select(MarketOperation::Sell, taker, maker, &candidates, &prices, U256::from(1u64))
            .expect("bridge");
        assert_eq!(last.paths[0], vec![taker, y]);
    }

    #[test]
    fn test_buy_reverses_and_inverts() {
        let (taker, maker, x) = (token(1), token(2), token(3));
        let candidates = vec![vec![taker, x], vec![x, maker]];
        let prices = vec![2.0, 4.0];

        let bridge = BridgeSelector::default()
            .select(MarketOperation::Buy, taker, maker, &candidates, &prices, U256::from(1000u64))
            .expect("bridge");

        assert_eq!(bridge.paths, vec![vec![x, maker], vec![taker, x]]);
        assert_eq!(bridge.prices, vec![0.25, 0.5]);
        // 1000 * 0.25 * 1.25 = 312.5, rounded half away from zero
        assert_eq!(bridge.amounts[1], U256::from(313u64));
    }
}
