use super::types::{ExchangeProxyOverhead, LiquiditySource};
use crate::data_sync::{FirmQuoteValidator, QuoteRequestor};
use crate::utils::config_loader::{LoadConfigError, load_from_file, load_from_str};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

/// Which per-edge fill optimizer the orchestrator runs.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FillOptimizerKind {
    /// Depth-first mixing of per-source fill paths, bounded by `run_limit`
    #[default]
    BoundedSearch,
    /// Greedy allocation over interpolated sample curves in `sample_router_steps` increments
    SampleRouter,
}

/// Which candidate wins when two bridges have the same combined price.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BridgeTieBreak {
    #[default]
    KeepFirst,
    KeepLast,
}

/// Optimizer configuration. Every field has a default so a partial TOML file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Chain the sampler talks to, selects source lists and the native fee token
    pub chain_id: u64,
    pub fill_optimizer: FillOptimizerKind,
    /// Hard ceiling on combinations explored by the bounded search
    pub run_limit: usize,
    /// Increments the sample router splits the target into
    pub sample_router_steps: usize,
    /// Slippage tolerated on bridge (DEX) orders
    pub bridge_slippage: f64,
    /// Maximum slippage of a fallback path relative to the primary path
    pub max_fallback_slippage: f64,
    /// Build fallback paths for routes that rely on fragile sources
    pub allow_fallback: bool,
    pub excluded_sources: Vec<LiquiditySource>,
    /// When not empty, only these sources are sampled
    pub included_sources: Vec<LiquiditySource>,
    /// Sources not trusted to price gas in terms of the traded tokens
    pub excluded_fee_sources: Vec<LiquiditySource>,
    /// Over-sampling factor applied when propagating an amount to the next bridge hop
    pub hop_amount_scaling: f64,
    /// Longest intermediate token path, the endpoints included
    pub max_intermediate_path_length: usize,
    pub bridge_tie_break: BridgeTieBreak,
    /// Optimize candidate routes on the rayon pool
    pub enable_parallel_route_search: bool,
    pub should_generate_quote_report: bool,
    pub should_include_price_comparisons_report: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            fill_optimizer: FillOptimizerKind::BoundedSearch,
            run_limit: 2usize.pow(15),
            sample_router_steps: 64,
            bridge_slippage: 0.005,
            max_fallback_slippage: 0.05,
            allow_fallback: true,
            excluded_sources: vec![],
            included_sources: vec![],
            excluded_fee_sources: vec![],
            hop_amount_scaling: 1.25,
            max_intermediate_path_length: 3,
            bridge_tie_break: BridgeTieBreak::KeepFirst,
            enable_parallel_route_search: true,
            should_generate_quote_report: false,
            should_include_price_comparisons_report: false,
        }
    }
}

fn env_var<T: FromStr>(name: &str) -> eyre::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value.trim().parse::<T>().map(Some).map_err(|e| eyre::eyre!("Invalid {}: {}", name, e)),
        Err(_) => Ok(None),
    }
}

fn env_sources(name: &str) -> eyre::Result<Option<Vec<LiquiditySource>>> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| LiquiditySource::from_str(s).map_err(|e| eyre::eyre!("Invalid {}: {} ({})", name, s, e)))
        .collect::<eyre::Result<Vec<_>>>()
        .map(Some)
}

impl OptimizerConfig {
    /// Load configuration from `OPTIMIZER_*` environment variables on top of the defaults
    pub fn from_env() -> eyre::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Some(chain_id) = env_var("OPTIMIZER_CHAIN_ID")? {
            config.chain_id = chain_id;
        }
        if let Some(fill_optimizer) = env_var("OPTIMIZER_FILL_OPTIMIZER")? {
            config.fill_optimizer = fill_optimizer;
        }
        if let Some(run_limit) = env_var("OPTIMIZER_RUN_LIMIT")? {
            config.run_limit = run_limit;
        }
        if let Some(steps) = env_var("OPTIMIZER_SAMPLE_ROUTER_STEPS")? {
            config.sample_router_steps = steps;
        }
        if let Some(slippage) = env_var("OPTIMIZER_BRIDGE_SLIPPAGE")? {
            config.bridge_slippage = slippage;
        }
        if let Some(slippage) = env_var("OPTIMIZER_MAX_FALLBACK_SLIPPAGE")? {
            config.max_fallback_slippage = slippage;
        }
        if let Some(allow_fallback) = env_var("OPTIMIZER_ALLOW_FALLBACK")? {
            config.allow_fallback = allow_fallback;
        }
        if let Some(sources) = env_sources("OPTIMIZER_EXCLUDED_SOURCES")? {
            config.excluded_sources = sources;
        }
        if let Some(sources) = env_sources("OPTIMIZER_INCLUDED_SOURCES")? {
            config.included_sources = sources;
        }
        if let Some(sources) = env_sources("OPTIMIZER_EXCLUDED_FEE_SOURCES")? {
            config.excluded_fee_sources = sources;
        }
        if let Some(scaling) = env_var("OPTIMIZER_HOP_AMOUNT_SCALING")? {
            config.hop_amount_scaling = scaling;
        }
        if let Some(length) = env_var("OPTIMIZER_MAX_INTERMEDIATE_PATH_LENGTH")? {
            config.max_intermediate_path_length = length;
        }
        if let Some(tie_break) = env_var("OPTIMIZER_BRIDGE_TIE_BREAK")? {
            config.bridge_tie_break = tie_break;
        }
        if let Some(parallel) = env_var("OPTIMIZER_ENABLE_PARALLEL_ROUTE_SEARCH")? {
            config.enable_parallel_route_search = parallel;
        }
        if let Some(report) = env_var("OPTIMIZER_SHOULD_GENERATE_QUOTE_REPORT")? {
            config.should_generate_quote_report = report;
        }
        if let Some(report) = env_var("OPTIMIZER_SHOULD_INCLUDE_PRICE_COMPARISONS_REPORT")? {
            config.should_include_price_comparisons_report = report;
        }

        Ok(config)
    }

    pub async fn load(file_name: String) -> Result<Self, LoadConfigError> {
        load_from_file(file_name).await
    }

    pub fn parse(raw_config: &str) -> Result<Self, LoadConfigError> {
        load_from_str(raw_config)
    }
}

/// Options forwarded to relayers with every quote request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqRequestOptions {
    pub tx_origin: Address,
    pub taker: Address,
    /// Request indicative (non-binding) quotes instead of firm ones
    pub is_indicative: bool,
    pub intent_on_filling: bool,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Off-exchange liquidity for one request.
#[derive(Clone)]
pub struct RfqtOpts {
    pub options: RfqRequestOptions,
    pub quote_requestor: Arc<dyn QuoteRequestor>,
    /// Supplies fillable amounts for firm quotes; full quote size when absent
    pub firm_quote_validator: Option<Arc<dyn FirmQuoteValidator>>,
}

impl RfqtOpts {
    pub fn new(options: RfqRequestOptions, quote_requestor: Arc<dyn QuoteRequestor>) -> Self {
        Self { options, quote_requestor, firm_quote_validator: None }
    }

    pub fn with_firm_quote_validator(mut self, validator: Arc<dyn FirmQuoteValidator>) -> Self {
        self.firm_quote_validator = Some(validator);
        self
    }
}

impl Debug for RfqtOpts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RfqtOpts")
            .field("options", &self.options)
            .field("has_firm_quote_validator", &self.firm_quote_validator.is_some())
            .finish()
    }
}

/// Per-request options, built once and passed by reference.
#[derive(Debug, Clone, Default)]
pub struct GetMarketOrdersOpts {
    pub config: OptimizerConfig,
    /// Wei per unit of gas
    pub gas_price: U256,
    pub exchange_proxy_overhead: ExchangeProxyOverhead,
    pub rfqt: Option<RfqtOpts>,
}

impl GetMarketOrdersOpts {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_exchange_proxy_overhead(mut self, exchange_proxy_overhead: ExchangeProxyOverhead) -> Self {
        self.exchange_proxy_overhead = exchange_proxy_overhead;
        self
    }

    pub fn with_rfqt(mut self, rfqt: RfqtOpts) -> Self {
        self.rfqt = Some(rfqt);
        self
    }
}
