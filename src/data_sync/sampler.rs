use crate::logic::types::{DexSample, LiquiditySource, MarketOperation, NativeOrder};
use crate::utils::Token;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;

/// On-chain liquidity sampling.
///
/// Every method given an empty source list returns no data rather than an error.
#[async_trait]
pub trait Sampler: Send + Sync {
    fn chain_id(&self) -> u64;

    /// Token metadata, in the order of `tokens`.
    async fn get_token_infos(&self, tokens: &[Address]) -> eyre::Result<Vec<Token>>;

    /// Sell-direction price of each token path: base units of the last token received
    /// per base unit of the first token. Zero when the path has no liquidity.
    async fn get_prices(&self, token_paths: &[Vec<Address>], sources: &[LiquiditySource]) -> eyre::Result<Vec<f64>>;

    /// One sample curve per source along `token_path`.
    ///
    /// Sells sample selling up to `amount` of the first token, buys sample buying up to
    /// `amount` of the last token. Curves are ordered by increasing input.
    async fn get_liquidity(
        &self,
        side: MarketOperation,
        token_path: &[Address],
        amount: U256,
        sources: &[LiquiditySource],
    ) -> eyre::Result<Vec<Vec<DexSample>>>;

    /// Taker amount still fillable for each order. Defaults to the full order size.
    async fn get_limit_order_fillable_taker_amounts(&self, orders: &[NativeOrder]) -> eyre::Result<Vec<U256>> {
        Ok(orders.iter().map(|order| order.taker_amount).collect())
    }
}
