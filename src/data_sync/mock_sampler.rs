use super::sampler::Sampler;
use crate::logic::token_pair::input_output_tokens_from_path;
use crate::logic::types::{DexSample, LiquiditySource, MarketOperation};
use crate::utils::Token;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use dashmap::DashMap;
use eyre::eyre;

/// In-memory sampler serving fixed curves and prices.
///
/// Curves are stored per side on the edge they quote (`input -> output`), prices per
/// `(first, last)` token of a path. Unknown tokens have 18 decimals.
#[derive(Debug, Default)]
pub struct MockSampler {
    chain_id: u64,
    tokens: DashMap<Address, Token>,
    curves: DashMap<(MarketOperation, Address, Address), Vec<Vec<DexSample>>>,
    prices: DashMap<(Address, Address), f64>,
    error: Option<String>,
    calls: DashMap<&'static str, usize>,
}

impl MockSampler {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id, ..Self::default() }
    }

    pub fn with_token(self, token: Token) -> Self {
        self.tokens.insert(token.get_address(), token);
        self
    }

    pub fn with_curve(self, side: MarketOperation, input_token: Address, output_token: Address, samples: Vec<DexSample>) -> Self {
        self.curves.entry((side, input_token, output_token)).or_default().push(samples);
        self
    }

    pub fn with_price(self, from: Address, to: Address, price: f64) -> Self {
        self.prices.insert((from, to), price);
        self
    }

    /// Every liquidity call fails with `message`.
    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.get(method).map(|count| *count).unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        *self.calls.entry(method).or_insert(0) += 1;
    }

    fn price(&self, token_path: &[Address]) -> f64 {
        match (token_path.first(), token_path.last()) {
            (Some(first), Some(last)) if first == last => 1.0,
            (Some(first), Some(last)) => self.prices.get(&(*first, *last)).map(|p| *p).unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

#[async_trait]
impl Sampler for MockSampler {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn get_token_infos(&self, tokens: &[Address]) -> eyre::Result<Vec<Token>> {
        self.record("get_token_infos");
        Ok(tokens.iter().map(|address| self.tokens.get(address).map(|t| t.clone()).unwrap_or_else(|| Token::new(*address))).collect())
    }

    async fn get_prices(&self, token_paths: &[Vec<Address>], sources: &[LiquiditySource]) -> eyre::Result<Vec<f64>> {
        self.record("get_prices");
        if sources.is_empty() {
            return Ok(vec![]);
        }
        Ok(token_paths.iter().map(|path| self.price(path)).collect())
    }

    async fn get_liquidity(
        &self,
        side: MarketOperation,
        token_path: &[Address],
        _amount: U256,
        sources: &[LiquiditySource],
    ) -> eyre::Result<Vec<Vec<DexSample>>> {
        self.record("get_liquidity");
        if let Some(message) = &self.error {
            return Err(eyre!("{}", message));
        }
        let Some((input_token, output_token)) = input_output_tokens_from_path(side, token_path) else {
            return Ok(vec![]);
        };
        let Some(curves) = self.curves.get(&(side, input_token, output_token)) else {
            return Ok(vec![]);
        };
        Ok(curves.iter().filter(|samples| samples.first().is_some_and(|s| sources.contains(&s.source))).cloned().collect())
    }
}
