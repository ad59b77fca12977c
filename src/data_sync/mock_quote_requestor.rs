use super::quote_requestor::{FirmQuoteValidator, QuoteRequestor, RfqQuoteType};
use crate::logic::config::RfqRequestOptions;
use crate::logic::types::{IndicativeQuote, MarketOperation, NativeOrder};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use dashmap::DashMap;
use eyre::eyre;

/// A quote request as seen by the relayer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRfqRequest {
    pub maker_token: Address,
    pub taker_token: Address,
    pub amount: U256,
    pub side: MarketOperation,
    pub comparison_price: Option<f64>,
}

/// Relayer answering every request with the same canned quotes.
#[derive(Debug, Default)]
pub struct MockQuoteRequestor {
    indicative_quotes: Vec<IndicativeQuote>,
    firm_quotes: Vec<NativeOrder>,
    error: Option<String>,
    requests: DashMap<RfqQuoteType, Vec<RecordedRfqRequest>>,
}

impl MockQuoteRequestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indicative_quotes(mut self, quotes: Vec<IndicativeQuote>) -> Self {
        self.indicative_quotes = quotes;
        self
    }

    pub fn with_firm_quotes(mut self, quotes: Vec<NativeOrder>) -> Self {
        self.firm_quotes = quotes;
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    pub fn requests(&self, quote_type: RfqQuoteType) -> Vec<RecordedRfqRequest> {
        self.requests.get(&quote_type).map(|r| r.clone()).unwrap_or_default()
    }

    fn record(
        &self,
        quote_type: RfqQuoteType,
        maker_token: Address,
        taker_token: Address,
        amount: U256,
        side: MarketOperation,
        comparison_price: Option<f64>,
    ) -> eyre::Result<()> {
        self.requests.entry(quote_type).or_default().push(RecordedRfqRequest { maker_token, taker_token, amount, side, comparison_price });
        match &self.error {
            Some(message) => Err(eyre!("{}", message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QuoteRequestor for MockQuoteRequestor {
    async fn request_indicative_quotes(
        &self,
        maker_token: Address,
        taker_token: Address,
        amount: U256,
        side: MarketOperation,
        comparison_price: Option<f64>,
        _options: &RfqRequestOptions,
    ) -> eyre::Result<Vec<IndicativeQuote>> {
        self.record(RfqQuoteType::Indicative, maker_token, taker_token, amount, side, comparison_price)?;
        Ok(self.indicative_quotes.clone())
    }

    async fn request_firm_quotes(
        &self,
        maker_token: Address,
        taker_token: Address,
        amount: U256,
        side: MarketOperation,
        comparison_price: Option<f64>,
        _options: &RfqRequestOptions,
    ) -> eyre::Result<Vec<NativeOrder>> {
        self.record(RfqQuoteType::Firm, maker_token, taker_token, amount, side, comparison_price)?;
        Ok(self.firm_quotes.clone())
    }
}

/// Validator reporting fixed fillable amounts.
#[derive(Debug, Clone, Default)]
pub struct MockFirmQuoteValidator {
    fillable_taker_amounts: Vec<U256>,
}

impl MockFirmQuoteValidator {
    pub fn new(fillable_taker_amounts: Vec<U256>) -> Self {
        Self { fillable_taker_amounts }
    }
}

#[async_trait]
impl FirmQuoteValidator for MockFirmQuoteValidator {
    async fn get_taker_fillable_amounts(&self, orders: &[NativeOrder]) -> eyre::Result<Vec<U256>> {
        Ok(orders.iter().enumerate().map(|(i, _)| self.fillable_taker_amounts.get(i).copied().unwrap_or_default()).collect())
    }
}
