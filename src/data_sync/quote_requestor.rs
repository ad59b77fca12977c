use crate::logic::config::RfqRequestOptions;
use crate::logic::types::{IndicativeQuote, MarketOperation, NativeOrder};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RfqQuoteType {
    Indicative,
    Firm,
}

/// Transport to off-exchange relayers.
///
/// `amount` is the taker amount for sells and the maker amount for buys.
/// `comparison_price` is the whole-order maker/taker unit price of the best on-chain
/// route, when there is one.
#[async_trait]
pub trait QuoteRequestor: Send + Sync {
    async fn request_indicative_quotes(
        &self,
        maker_token: Address,
        taker_token: Address,
        amount: U256,
        side: MarketOperation,
        comparison_price: Option<f64>,
        options: &RfqRequestOptions,
    ) -> eyre::Result<Vec<IndicativeQuote>>;

    async fn request_firm_quotes(
        &self,
        maker_token: Address,
        taker_token: Address,
        amount: U256,
        side: MarketOperation,
        comparison_price: Option<f64>,
        options: &RfqRequestOptions,
    ) -> eyre::Result<Vec<NativeOrder>>;
}

/// Soft validation of firm quotes against maker balances.
#[async_trait]
pub trait FirmQuoteValidator: Send + Sync {
    /// Fillable taker amount per order, in order.
    async fn get_taker_fillable_amounts(&self, orders: &[NativeOrder]) -> eyre::Result<Vec<U256>>;
}
