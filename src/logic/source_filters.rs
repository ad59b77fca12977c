use super::types::LiquiditySource;
use crate::utils::constants::{MAINNET_CHAIN_ID, MANTLE_CHAIN_ID};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Allow/deny policy over liquidity sources.
///
/// A source is allowed when it is in the valid set (an empty valid set allows
/// everything), not excluded, and present in the inclusion list if one is set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFilters {
    valid_sources: Vec<LiquiditySource>,
    excluded_sources: Vec<LiquiditySource>,
    included_sources: Vec<LiquiditySource>,
}

fn unique(sources: impl IntoIterator<Item = LiquiditySource>) -> Vec<LiquiditySource> {
    let mut out: Vec<LiquiditySource> = Vec::new();
    for source in sources {
        if !out.contains(&source) {
            out.push(source);
        }
    }
    out
}

impl SourceFilters {
    pub fn new(valid_sources: Vec<LiquiditySource>) -> Self {
        Self { valid_sources: unique(valid_sources), ..Self::default() }
    }

    pub fn all() -> Self {
        Self::new(LiquiditySource::iter().collect())
    }

    pub fn is_allowed(&self, source: LiquiditySource) -> bool {
        if !self.valid_sources.is_empty() && !self.valid_sources.contains(&source) {
            return false;
        }
        if self.excluded_sources.contains(&source) {
            return false;
        }
        if !self.included_sources.is_empty() && !self.included_sources.contains(&source) {
            return false;
        }
        true
    }

    /// Allowed sources, in valid-set order.
    pub fn sources(&self) -> Vec<LiquiditySource> {
        self.valid_sources.iter().copied().filter(|s| self.is_allowed(*s)).collect()
    }

    pub fn exclude(&self, sources: &[LiquiditySource]) -> Self {
        Self {
            valid_sources: self.valid_sources.clone(),
            excluded_sources: unique(self.excluded_sources.iter().chain(sources).copied()),
            included_sources: self.included_sources.clone(),
        }
    }

    pub fn include(&self, sources: &[LiquiditySource]) -> Self {
        Self {
            valid_sources: self.valid_sources.clone(),
            excluded_sources: self.excluded_sources.clone(),
            included_sources: unique(self.included_sources.iter().chain(sources).copied()),
        }
    }

    /// Intersection of two policies.
    pub fn merge(&self, other: &SourceFilters) -> Self {
        let valid_sources = if self.valid_sources.is_empty() {
            other.valid_sources.clone()
        } else if other.valid_sources.is_empty() {
            self.valid_sources.clone()
        } else {
            self.valid_sources.iter().copied().filter(|s| other.valid_sources.contains(s)).collect()
        };
        Self {
            valid_sources: unique(valid_sources),
            excluded_sources: unique(self.excluded_sources.iter().chain(&other.excluded_sources).copied()),
            included_sources: unique(self.included_sources.iter().chain(&other.included_sources).copied()),
        }
    }
}

pub fn sell_source_filters(chain_id: u64) -> SourceFilters {
    match chain_id {
        MAINNET_CHAIN_ID => SourceFilters::new(vec![
            LiquiditySource::Native,
            LiquiditySource::Uniswap,
            LiquiditySource::UniswapV2,
            LiquiditySource::UniswapV3,
            LiquiditySource::SushiSwap,
            LiquiditySource::Curve,
            LiquiditySource::Balancer,
            LiquiditySource::BalancerV2,
            LiquiditySource::Kyber,
            LiquiditySource::LiquidityProvider,
            LiquiditySource::MultiHop,
        ]),
        MANTLE_CHAIN_ID => SourceFilters::new(vec![
            LiquiditySource::Native,
            LiquiditySource::UniswapV3,
            LiquiditySource::Agni,
            LiquiditySource::MerchantMoe,
            LiquiditySource::MultiHop,
        ]),
        _ => SourceFilters::all(),
    }
}

pub fn buy_source_filters(chain_id: u64) -> SourceFilters {
    // Kyber cannot quote exact-output amounts
    sell_source_filters(chain_id).exclude(&[LiquiditySource::Kyber])
}

/// Sources trusted for pricing gas in terms of arbitrary tokens.
pub fn fee_source_filters(chain_id: u64) -> SourceFilters {
    match chain_id {
        MAINNET_CHAIN_ID => {
            SourceFilters::new(vec![LiquiditySource::UniswapV2, LiquiditySource::UniswapV3, LiquiditySource::SushiSwap])
        }
        MANTLE_CHAIN_ID => SourceFilters::new(vec![LiquiditySource::UniswapV3, LiquiditySource::Agni]),
        _ => SourceFilters::all(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_and_inclusion() {
        let filters = SourceFilters::new(vec![LiquiditySource::Native, LiquiditySource::UniswapV2, LiquiditySource::Curve]);
        let excluded = filters.exclude(&[LiquiditySource::Curve]);
        assert_eq!(excluded.sources(), vec![LiquiditySource::Native, LiquiditySource::UniswapV2]);

        let included = excluded.include(&[LiquiditySource::Native]);
        assert_eq!(included.sources(), vec![LiquiditySource::Native]);
        assert!(!included.is_allowed(LiquiditySource::UniswapV2));
    }

    #[test]
    fn test_merge_is_intersection() {
        let chain = SourceFilters::new(vec![LiquiditySource::Native, LiquiditySource::UniswapV2, LiquiditySource::Curve]);
        let request = SourceFilters::default().exclude(&[LiquiditySource::Native]);
        let merged = chain.merge(&request);
        assert_eq!(merged.sources(), vec![LiquiditySource::UniswapV2, LiquiditySource::Curve]);

        let narrower = SourceFilters::new(vec![LiquiditySource::Curve, LiquiditySource::Balancer]);
        assert_eq!(merged.merge(&narrower).sources(), vec![LiquiditySource::Curve]);
    }

    #[test]
    fn test_empty_valid_set_allows_everything_not_excluded() {
        let filters = SourceFilters::default().exclude(&[LiquiditySource::Kyber]);
        assert!(filters.is_allowed(LiquiditySource::Native));
        assert!(!filters.is_allowed(LiquiditySource::Kyber));
        assert!(filters.sources().is_empty());
    }

    #[test]
    fn test_buy_sources_drop_kyber() {
        assert!(sell_source_filters(MAINNET_CHAIN_ID).is_allowed(LiquiditySource::Kyber));
        assert!(!buy_source_filters(MAINNET_CHAIN_ID).is_allowed(LiquiditySource::Kyber));
    }
}
