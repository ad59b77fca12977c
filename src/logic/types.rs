use super::graph::QuoteGraph;
use super::source_filters::SourceFilters;
use super::token_pair::taker_maker_from_input_output;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString, VariantNames};

/// Amount of a token (base units) obtained for one wei of the native fee token.
pub type TokenAmountPerEth = HashMap<Address, f64>;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketOperation {
    /// Input is the taker token, output is the maker token
    Sell,
    /// Input is the maker token, output is the taker token
    Buy,
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Hash, Eq, EnumString, VariantNames, Deserialize, Serialize, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquiditySource {
    Native,
    Uniswap,
    UniswapV2,
    UniswapV3,
    SushiSwap,
    Curve,
    Balancer,
    BalancerV2,
    Kyber,
    LiquidityProvider,
    MultiHop,
    Agni,
    MerchantMoe,
}

impl LiquiditySource {
    /// Sources whose liquidity may vanish between quoting and settlement.
    pub fn is_fragile(&self) -> bool {
        matches!(self, LiquiditySource::Native | LiquiditySource::LiquidityProvider)
    }

    pub fn flag(&self) -> SourceFlags {
        SourceFlags(1u128 << (*self as u8))
    }
}

/// Bitmask of liquidity sources used by a fill or path.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFlags(pub u128);

impl SourceFlags {
    pub const EMPTY: SourceFlags = SourceFlags(0);
    pub const LIMIT_ORDER: SourceFlags = SourceFlags(1u128 << 64);
    pub const RFQ_ORDER: SourceFlags = SourceFlags(1u128 << 65);

    pub fn contains(&self, other: SourceFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SourceFlags {
    type Output = SourceFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        SourceFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for SourceFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

/// Extra cost, in wei of the native fee token, charged by the settlement proxy for a
/// given combination of sources.
#[derive(Clone)]
pub struct ExchangeProxyOverhead(Arc<dyn Fn(SourceFlags) -> f64 + Send + Sync>);

impl ExchangeProxyOverhead {
    pub fn new<F: Fn(SourceFlags) -> f64 + Send + Sync + 'static>(f: F) -> Self {
        Self(Arc::new(f))
    }

    pub fn zero() -> Self {
        Self::new(|_| 0.0)
    }

    pub fn cost(&self, flags: SourceFlags) -> f64 {
        (self.0)(flags)
    }

    /// Overhead for a path whose own flags come on top of flags already paid for.
    pub fn with_paid_flags(&self, paid: SourceFlags) -> Self {
        let inner = self.0.clone();
        Self::new(move |flags| inner(flags | paid))
    }
}

impl Default for ExchangeProxyOverhead {
    fn default() -> Self {
        Self::zero()
    }
}

impl Debug for ExchangeProxyOverhead {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExchangeProxyOverhead")
    }
}

/// One sampled point of a liquidity curve: selling `input` yields `output`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexSample {
    pub source: LiquiditySource,
    pub input: U256,
    pub output: U256,
    #[serde(default)]
    pub gas_cost: u64,
}

impl DexSample {
    pub fn new(source: LiquiditySource, input: U256, output: U256) -> Self {
        Self { source, input, output, gas_cost: 0 }
    }

    pub fn with_gas_cost(mut self, gas_cost: u64) -> Self {
        self.gas_cost = gas_cost;
        self
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NativeOrderType {
    Limit,
    Rfq,
}

impl NativeOrderType {
    pub fn flag(&self) -> SourceFlags {
        match self {
            NativeOrderType::Limit => SourceFlags::LIMIT_ORDER,
            NativeOrderType::Rfq => SourceFlags::RFQ_ORDER,
        }
    }
}

/// A resting maker-signed order. Signatures are carried opaquely by the settlement layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeOrder {
    pub order_type: NativeOrderType,
    pub maker_token: Address,
    pub taker_token: Address,
    pub maker_amount: U256,
    pub taker_amount: U256,
    #[serde(default)]
    pub taker_token_fee_amount: U256,
    #[serde(default)]
    pub maker: Address,
    #[serde(default)]
    pub tx_origin: Address,
    #[serde(default)]
    pub expiry: u64,
    #[serde(default)]
    pub salt: U256,
}

impl NativeOrder {
    pub fn new_limit(maker_token: Address, taker_token: Address, maker_amount: U256, taker_amount: U256) -> Self {
        Self {
            order_type: NativeOrderType::Limit,
            maker_token,
            taker_token,
            maker_amount,
            taker_amount,
            taker_token_fee_amount: U256::ZERO,
            maker: Address::ZERO,
            tx_origin: Address::ZERO,
            expiry: 0,
            salt: U256::ZERO,
        }
    }

    pub fn new_rfq(maker_token: Address, taker_token: Address, maker_amount: U256, taker_amount: U256) -> Self {
        Self { order_type: NativeOrderType::Rfq, ..Self::new_limit(maker_token, taker_token, maker_amount, taker_amount) }
    }

    /// Maker amount received for `taker_fill_amount`, rounded down in the maker's favour.
    pub fn adjusted_maker_fill_amount(&self, taker_fill_amount: U256) -> U256 {
        crate::utils::mul_div(taker_fill_amount, self.maker_amount, self.taker_amount)
    }
}

/// A native order together with the amounts still fillable this round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeOrderWithFillableAmounts {
    pub order: NativeOrder,
    pub fillable_taker_amount: U256,
    pub fillable_maker_amount: U256,
    pub fillable_taker_fee_amount: U256,
}

impl NativeOrderWithFillableAmounts {
    /// Caps an order by a fillable taker amount, deriving the maker side from the order ratio.
    pub fn from_taker_amount(order: NativeOrder, fillable_taker_amount: U256) -> Self {
        let fillable_taker_amount = fillable_taker_amount.min(order.taker_amount);
        let fillable_maker_amount = order.adjusted_maker_fill_amount(fillable_taker_amount);
        let fillable_taker_fee_amount = crate::utils::mul_div(fillable_taker_amount, order.taker_token_fee_amount, order.taker_amount);
        Self { order, fillable_taker_amount, fillable_maker_amount, fillable_taker_fee_amount }
    }
}

/// A non-binding price level advertised by an RFQ maker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicativeQuote {
    pub maker_token: Address,
    pub taker_token: Address,
    pub maker_amount: U256,
    pub taker_amount: U256,
    pub expiry: u64,
}

impl IndicativeQuote {
    pub fn to_native_order(&self) -> NativeOrder {
        NativeOrder { expiry: self.expiry, ..NativeOrder::new_rfq(self.maker_token, self.taker_token, self.maker_amount, self.taker_amount) }
    }
}

/// All liquidity available for converting `input_token` into `output_token`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HopQuotes {
    pub input_token: Address,
    pub output_token: Address,
    /// One sample curve per source, ordered by increasing input.
    pub dex_quotes: Vec<Vec<DexSample>>,
    pub native_orders: Vec<NativeOrderWithFillableAmounts>,
}

impl HopQuotes {
    pub fn new(input_token: Address, output_token: Address) -> Self {
        Self { input_token, output_token, dex_quotes: Vec::new(), native_orders: Vec::new() }
    }

    pub fn with_dex_quotes(mut self, dex_quotes: Vec<Vec<DexSample>>) -> Self {
        self.dex_quotes = dex_quotes;
        self
    }

    pub fn with_native_orders(mut self, native_orders: Vec<NativeOrderWithFillableAmounts>) -> Self {
        self.native_orders = native_orders;
        self
    }

    pub fn connects(&self, input_token: Address, output_token: Address) -> bool {
        self.input_token == input_token && self.output_token == output_token
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FillOrderType {
    Bridge,
    Limit,
    Rfq,
}

impl From<NativeOrderType> for FillOrderType {
    fn from(order_type: NativeOrderType) -> Self {
        match order_type {
            NativeOrderType::Limit => FillOrderType::Limit,
            NativeOrderType::Rfq => FillOrderType::Rfq,
        }
    }
}

/// A concrete order produced by collapsing a path.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizedOrder {
    pub source: LiquiditySource,
    pub order_type: FillOrderType,
    pub maker_token: Address,
    pub taker_token: Address,
    pub maker_amount: U256,
    pub taker_amount: U256,
    pub native_order: Option<Arc<NativeOrderWithFillableAmounts>>,
    /// Number of fills merged into this order
    pub fill_count: usize,
}

/// The finalized choice for one edge of a route.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizedHop {
    pub orders: Vec<OptimizedOrder>,
    pub input_token: Address,
    pub output_token: Address,
    pub input_amount: U256,
    pub output_amount: U256,
    pub adjusted_complete_rate: f64,
    pub source_flags: SourceFlags,
    pub has_fallback: bool,
}

/// Everything gathered for one side of a swap before optimization.
#[derive(Clone, Debug)]
pub struct MarketSideLiquidity {
    pub side: MarketOperation,
    pub input_amount: U256,
    pub input_token: Address,
    pub output_token: Address,
    pub token_amount_per_eth: TokenAmountPerEth,
    pub quote_source_filters: SourceFilters,
    pub maker_token_decimals: u8,
    pub taker_token_decimals: u8,
    pub gas_price: U256,
    pub quotes: QuoteGraph,
    pub is_rfq_supported: bool,
}

impl MarketSideLiquidity {
    pub fn taker_maker_tokens(&self) -> (Address, Address) {
        taker_maker_from_input_output(self.side, self.input_token, self.output_token)
    }

    pub fn amount_per_eth(&self, token: Address) -> f64 {
        self.token_amount_per_eth.get(&token).copied().unwrap_or(0.0)
    }
}

#[derive(Clone, Debug)]
pub struct OptimizerResult {
    pub hops: Vec<OptimizedHop>,
    /// Product of every hop's adjusted complete rate
    pub adjusted_rate: f64,
    pub market_side_liquidity: MarketSideLiquidity,
    pub taker_amount_per_eth: f64,
    pub maker_amount_per_eth: f64,
}

impl OptimizerResult {
    pub fn input_token(&self) -> Option<Address> {
        self.hops.first().map(|hop| hop.input_token)
    }

    pub fn output_token(&self) -> Option<Address> {
        self.hops.last().map(|hop| hop.output_token)
    }

    pub fn output_amount(&self) -> U256 {
        self.hops.last().map(|hop| hop.output_amount).unwrap_or_default()
    }
}

/// Overall adjusted rate of a multi-hop route.
pub fn hop_route_overall_rate(hops: &[OptimizedHop]) -> f64 {
    hops.iter().fold(1.0, |rate, hop| rate * hop.adjusted_complete_rate)
}
