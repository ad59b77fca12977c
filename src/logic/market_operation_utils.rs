use super::bridge::{BridgeSelector, TwoHopBridge};
use super::comparison_price::{ComparisonPrice, get_comparison_prices};
use super::config::{GetMarketOrdersOpts, OptimizerConfig, RfqtOpts};
use super::graph::{QuoteGraph, TokenAdjacencyGraph};
use super::hop_optimizer::HopOptimizer;
use super::optimizer::{FillOptimizer, fill_optimizer_from_config};
use super::pathfinder::Pathfinder;
use super::report::{OptimizerResultWithReport, generate_price_comparisons_report, generate_quote_report};
use super::rfq::inject_rfq_liquidity;
use super::route_search::HopRouteSearch;
use super::source_filters::{SourceFilters, buy_source_filters, fee_source_filters, sell_source_filters};
use super::token_pair::{input_output_from_taker_maker, input_output_tokens_from_path};
use super::types::{
    HopQuotes, IndicativeQuote, LiquiditySource, MarketOperation, MarketSideLiquidity, NativeOrder, NativeOrderWithFillableAmounts,
    OptimizerResult, TokenAmountPerEth, hop_route_overall_rate,
};
use crate::data_sync::{RfqQuoteType, Sampler};
use crate::error::{AggregationError, AggregationResult};
use crate::utils::constants::native_fee_token;
use alloy_primitives::{Address, U256};
use eyre::eyre;
use futures::future::{join_all, try_join_all};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Off-exchange orders and their fillable taker amounts.
type RfqLiquidity = (Vec<NativeOrder>, Vec<U256>);

/// Top level of the optimizer.
///
/// Gathers liquidity for one side of a swap, finds the best hop route over it, and
/// refines the route with off-exchange quotes when the request allows it.
pub struct MarketOperationUtils {
    sampler: Arc<dyn Sampler>,
    chain_id: u64,
    sell_sources: SourceFilters,
    buy_sources: SourceFilters,
    fee_sources: SourceFilters,
    /// Token gas is paid in, `None` on chains without one
    native_fee_token: Option<Address>,
    token_adjacency: TokenAdjacencyGraph,
    fill_optimizer: Arc<dyn FillOptimizer>,
}

impl MarketOperationUtils {
    /// Source lists, the fee token and the fill optimizer are fixed here from `config`.
    pub fn new(sampler: Arc<dyn Sampler>, config: &OptimizerConfig) -> Self {
        let chain_id = config.chain_id;
        if sampler.chain_id() != chain_id {
            warn!(config_chain_id = chain_id, sampler_chain_id = sampler.chain_id(), "Sampler chain differs from configured chain");
        }
        Self {
            sampler,
            chain_id,
            sell_sources: sell_source_filters(chain_id),
            buy_sources: buy_source_filters(chain_id),
            fee_sources: fee_source_filters(chain_id),
            native_fee_token: native_fee_token(chain_id),
            token_adjacency: TokenAdjacencyGraph::for_chain(chain_id),
            fill_optimizer: fill_optimizer_from_config(config),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn fill_optimizer(&self) -> &Arc<dyn FillOptimizer> {
        &self.fill_optimizer
    }

    fn source_filters(&self, side: MarketOperation) -> &SourceFilters {
        match side {
            MarketOperation::Sell => &self.sell_sources,
            MarketOperation::Buy => &self.buy_sources,
        }
    }

    fn hop_route_search(&self, opts: &GetMarketOrdersOpts) -> HopRouteSearch {
        let config = &opts.config;
        let hop_optimizer = HopOptimizer::new(self.fill_optimizer.clone())
            .with_gas_price(opts.gas_price)
            .with_exchange_proxy_overhead(opts.exchange_proxy_overhead.clone())
            .with_slippage(config.bridge_slippage, config.max_fallback_slippage)
            .with_allow_fallback(config.allow_fallback);
        HopRouteSearch::new(hop_optimizer, config.enable_parallel_route_search)
    }

    /// Best two-hop bridge between the pair, priced with `sources`.
    async fn multi_hop_legs(
        &self,
        side: MarketOperation,
        taker_token: Address,
        maker_token: Address,
        sources: &[LiquiditySource],
        input_amount: U256,
        config: &OptimizerConfig,
    ) -> eyre::Result<Option<TwoHopBridge>> {
        let pathfinder = Pathfinder::new(config.max_intermediate_path_length);
        let hop_token_paths = pathfinder.intermediate_token_paths(&self.token_adjacency, taker_token, maker_token);
        if hop_token_paths.is_empty() {
            return Ok(None);
        }
        let prices = self.sampler.get_prices(&hop_token_paths, sources).await?;
        let selector = BridgeSelector::new(config.bridge_tie_break, config.hop_amount_scaling);
        Ok(selector.select(side, taker_token, maker_token, &hop_token_paths, &prices, input_amount))
    }

    /// Samples every edge the swap may use: the direct pair with the supplied native
    /// orders, and the legs of the best two-hop bridge.
    ///
    /// The token pair is taken from the first order. Orders with no maker amount only
    /// carry the pair and are not traded.
    pub async fn get_market_side_liquidity(
        &self,
        native_orders: &[NativeOrder],
        amount: U256,
        side: MarketOperation,
        opts: &GetMarketOrdersOpts,
    ) -> AggregationResult<MarketSideLiquidity> {
        let Some(first_order) = native_orders.first() else {
            return Err(AggregationError::EmptyOrders);
        };
        let (maker_token, taker_token) = (first_order.maker_token, first_order.taker_token);
        if maker_token == taker_token {
            return Err(AggregationError::InvalidInput(format!("maker and taker token are both {}", maker_token)));
        }
        let config = &opts.config;

        let request_filters = SourceFilters::default().exclude(&config.excluded_sources).include(&config.included_sources);
        let quote_source_filters = self.source_filters(side).merge(&request_filters);
        let fee_source_filters = self.fee_sources.exclude(&config.excluded_fee_sources);
        let sources = quote_source_filters.sources();
        let fee_sources = fee_source_filters.sources();

        let native_orders: Vec<NativeOrder> = if quote_source_filters.is_allowed(LiquiditySource::Native) {
            native_orders.iter().filter(|order| !order.maker_amount.is_zero()).cloned().collect()
        } else {
            vec![]
        };

        let bridge = if quote_source_filters.is_allowed(LiquiditySource::MultiHop) {
            self.multi_hop_legs(side, taker_token, maker_token, &sources, amount, config).await?
        } else {
            None
        };
        let (legs, leg_amounts) = bridge.map(|b| (b.paths, b.amounts)).unwrap_or_default();

        let mut terminal_tokens = vec![taker_token, maker_token];
        for leg in legs.iter() {
            for token in [leg.first(), leg.last()].into_iter().flatten() {
                if !terminal_tokens.contains(token) {
                    terminal_tokens.push(*token);
                }
            }
        }
        let price_paths: Vec<Vec<Address>> = match self.native_fee_token {
            Some(fee_token) => terminal_tokens.iter().map(|token| vec![fee_token, *token]).collect(),
            None => vec![],
        };

        let info_tokens = [maker_token, taker_token];
        let direct_path = [taker_token, maker_token];
        let (token_infos, token_prices_per_eth, direct_quotes, leg_quotes, fillable_taker_amounts) = tokio::try_join!(
            self.sampler.get_token_infos(&info_tokens),
            self.sampler.get_prices(&price_paths, &fee_sources),
            self.sampler.get_liquidity(side, &direct_path, amount, &sources),
            try_join_all(legs.iter().zip(leg_amounts.iter()).map(|(leg, leg_amount)| self.sampler.get_liquidity(side, leg, *leg_amount, &sources))),
            self.sampler.get_limit_order_fillable_taker_amounts(&native_orders),
        )?;

        let maker_token_info = token_infos.first().ok_or_else(|| eyre!("Missing token info for {}", maker_token))?;
        let taker_token_info = token_infos.get(1).ok_or_else(|| eyre!("Missing token info for {}", taker_token))?;
        let (maker_token_decimals, taker_token_decimals) = (maker_token_info.get_decimals(), taker_token_info.get_decimals());

        let token_amount_per_eth: TokenAmountPerEth = terminal_tokens
            .iter()
            .enumerate()
            .map(|(i, token)| (*token, token_prices_per_eth.get(i).copied().unwrap_or(0.0)))
            .collect();

        let native_orders: Vec<NativeOrderWithFillableAmounts> = native_orders
            .into_iter()
            .enumerate()
            .map(|(i, order)| {
                let fillable_taker_amount = fillable_taker_amounts.get(i).copied().unwrap_or_default();
                NativeOrderWithFillableAmounts::from_taker_amount(order, fillable_taker_amount)
            })
            .collect();

        let (input_token, output_token) = input_output_from_taker_maker(side, taker_token, maker_token);
        let mut edges = vec![HopQuotes::new(input_token, output_token).with_dex_quotes(direct_quotes).with_native_orders(native_orders)];
        for (leg, dex_quotes) in legs.iter().zip(leg_quotes) {
            if let Some((leg_input, leg_output)) = input_output_tokens_from_path(side, leg) {
                edges.push(HopQuotes::new(leg_input, leg_output).with_dex_quotes(dex_quotes));
            }
        }

        debug!(
            ?side,
            maker_token = %maker_token_info.get_symbol(),
            taker_token = %taker_token_info.get_symbol(),
            %amount,
            sources = sources.len(),
            legs = legs.len(),
            edges = edges.len(),
            "Gathered market side liquidity"
        );

        Ok(MarketSideLiquidity {
            side,
            input_amount: amount,
            input_token,
            output_token,
            token_amount_per_eth,
            quote_source_filters,
            maker_token_decimals,
            taker_token_decimals,
            gas_price: opts.gas_price,
            quotes: QuoteGraph::new(edges),
            is_rfq_supported: opts.rfqt.is_some(),
        })
    }

    /// Best hop route over the liquidity, `NoOptimalPath` when nothing connects the pair.
    pub fn generate_optimized_orders(&self, market_side_liquidity: &MarketSideLiquidity, opts: &GetMarketOrdersOpts) -> AggregationResult<OptimizerResult> {
        let MarketSideLiquidity { side, input_amount, input_token, output_token, .. } = *market_side_liquidity;
        let Some(hops) = self.hop_route_search(opts).find_best_optimized_hop_route(
            side,
            input_token,
            output_token,
            input_amount,
            &market_side_liquidity.quotes,
            &market_side_liquidity.token_amount_per_eth,
        ) else {
            debug!(?side, %input_token, %output_token, edges = market_side_liquidity.quotes.len(), "No hop route found");
            return Err(AggregationError::NoOptimalPath);
        };

        let (taker_token, maker_token) = market_side_liquidity.taker_maker_tokens();
        Ok(OptimizerResult {
            adjusted_rate: hop_route_overall_rate(&hops),
            hops,
            market_side_liquidity: market_side_liquidity.clone(),
            taker_amount_per_eth: market_side_liquidity.amount_per_eth(taker_token),
            maker_amount_per_eth: market_side_liquidity.amount_per_eth(maker_token),
        })
    }

    /// One round trip to the relayers. `None` when no quotes came back.
    async fn request_rfq_liquidity(
        &self,
        rfqt: &RfqtOpts,
        maker_token: Address,
        taker_token: Address,
        amount: U256,
        side: MarketOperation,
        comparison_price: ComparisonPrice,
    ) -> AggregationResult<Option<RfqLiquidity>> {
        let time_start = Instant::now();
        let options = &rfqt.options;

        if options.is_indicative {
            let quotes = rfqt
                .quote_requestor
                .request_indicative_quotes(maker_token, taker_token, amount, side, comparison_price.whole_order, options)
                .await?;
            info!(rfq_quote_type = %RfqQuoteType::Indicative, delta_time_ms = time_start.elapsed().as_millis() as u64, quotes = quotes.len(), "RFQ round trip");
            if quotes.is_empty() {
                return Ok(None);
            }
            let orders: Vec<NativeOrder> = quotes.iter().map(IndicativeQuote::to_native_order).collect();
            let fillable_taker_amounts = orders.iter().map(|order| order.taker_amount).collect();
            return Ok(Some((orders, fillable_taker_amounts)));
        }

        let orders = rfqt.quote_requestor.request_firm_quotes(maker_token, taker_token, amount, side, comparison_price.whole_order, options).await?;
        info!(rfq_quote_type = %RfqQuoteType::Firm, delta_time_ms = time_start.elapsed().as_millis() as u64, quotes = orders.len(), "RFQ round trip");
        if orders.is_empty() {
            return Ok(None);
        }
        let fillable_taker_amounts = match &rfqt.firm_quote_validator {
            Some(validator) => validator.get_taker_fillable_amounts(&orders).await?,
            None => orders.iter().map(|order| order.taker_amount).collect(),
        };
        Ok(Some((orders, fillable_taker_amounts)))
    }

    /// Optimizes a swap of `amount` on the pair of `native_orders`.
    ///
    /// The on-chain route is computed first. A missing on-chain route is tolerated
    /// while off-exchange quotes may still fill the swap. Once quotes are injected the
    /// route is recomputed and any failure is returned as is.
    pub async fn get_optimizer_result(
        &self,
        native_orders: &[NativeOrder],
        amount: U256,
        side: MarketOperation,
        opts: &GetMarketOrdersOpts,
    ) -> AggregationResult<OptimizerResultWithReport> {
        let Some(first_order) = native_orders.first() else {
            return Err(AggregationError::EmptyOrders);
        };
        let (maker_token, taker_token) = (first_order.maker_token, first_order.taker_token);

        let mut market_side_liquidity = self.get_market_side_liquidity(native_orders, amount, side, opts).await?;
        let mut optimizer_result = match self.generate_optimized_orders(&market_side_liquidity, opts) {
            Ok(result) => Some(result),
            Err(e) if e.is_no_optimal_path() => {
                warn!(?side, %maker_token, %taker_token, %amount, "No on-chain route, continuing with off-exchange liquidity");
                None
            }
            Err(e) => return Err(e),
        };

        let comparison_price = optimizer_result
            .as_ref()
            .map(|result| get_comparison_prices(result.adjusted_rate, amount, &market_side_liquidity, opts.gas_price))
            .unwrap_or_default();

        let rfqt = opts
            .rfqt
            .as_ref()
            .filter(|_| market_side_liquidity.is_rfq_supported && market_side_liquidity.quote_source_filters.is_allowed(LiquiditySource::Native));
        if let Some(rfqt) = rfqt {
            if let Some((orders, fillable_taker_amounts)) = self.request_rfq_liquidity(rfqt, maker_token, taker_token, amount, side, comparison_price).await? {
                market_side_liquidity.quotes = inject_rfq_liquidity(&market_side_liquidity.quotes, side, &orders, &fillable_taker_amounts);
                optimizer_result = Some(self.generate_optimized_orders(&market_side_liquidity, opts)?);
            }
        }

        let Some(result) = optimizer_result else {
            return Err(AggregationError::NoOptimalPath);
        };
        info!(
            ?side,
            hops = result.hops.len(),
            input_amount = %amount,
            output_amount = %result.output_amount(),
            adjusted_rate = result.adjusted_rate,
            "Optimized swap"
        );

        let quote_report = opts.config.should_generate_quote_report.then(|| generate_quote_report(side, &result.hops, comparison_price));
        let price_comparisons_report = opts
            .config
            .should_include_price_comparisons_report
            .then(|| generate_price_comparisons_report(&market_side_liquidity, comparison_price));

        Ok(OptimizerResultWithReport { result, quote_report, price_comparisons_report })
    }

    /// Optimizes each `(orders, amount)` entry on its own, on-chain liquidity only.
    ///
    /// Results line up with the batch. An entry without orders is `Err(EmptyOrders)`
    /// and an entry without a route is `Ok(None)`. Sampling failures stay with the
    /// entry that hit them.
    pub async fn get_batch_market_orders(
        &self,
        batch: &[(Vec<NativeOrder>, U256)],
        side: MarketOperation,
        opts: &GetMarketOrdersOpts,
    ) -> AggregationResult<Vec<AggregationResult<Option<OptimizerResult>>>> {
        if batch.is_empty() {
            return Err(AggregationError::EmptyOrders);
        }
        let batch_opts = GetMarketOrdersOpts { rfqt: None, ..opts.clone() };
        let batch_opts = &batch_opts;

        let results = join_all(batch.iter().map(|(orders, amount)| async move {
            if orders.is_empty() {
                return Err(AggregationError::EmptyOrders);
            }
            let market_side_liquidity = self.get_market_side_liquidity(orders, *amount, side, batch_opts).await?;
            match self.generate_optimized_orders(&market_side_liquidity, batch_opts) {
                Ok(result) => Ok(Some(result)),
                Err(e) if e.is_no_optimal_path() => Ok(None),
                Err(e) => Err(e),
            }
        }))
        .await;

        debug!(entries = batch.len(), resolved = results.iter().filter(|r| matches!(r, Ok(Some(_)))).count(), "Optimized batch");
        Ok(results)
    }
}

/// Builder for [`MarketOperationUtils`].
pub struct MarketOperationUtilsBuilder {
    sampler: Option<Arc<dyn Sampler>>,
    config: OptimizerConfig,
    token_adjacency: Option<TokenAdjacencyGraph>,
    fill_optimizer: Option<Arc<dyn FillOptimizer>>,
}

impl MarketOperationUtilsBuilder {
    pub fn new() -> Self {
        Self { sampler: None, config: OptimizerConfig::default(), token_adjacency: None, fill_optimizer: None }
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the chain's default intermediate tokens.
    pub fn with_token_adjacency(mut self, token_adjacency: TokenAdjacencyGraph) -> Self {
        self.token_adjacency = Some(token_adjacency);
        self
    }

    /// Replaces the fill optimizer picked from the config.
    pub fn with_fill_optimizer(mut self, fill_optimizer: Arc<dyn FillOptimizer>) -> Self {
        self.fill_optimizer = Some(fill_optimizer);
        self
    }

    pub fn build(self) -> eyre::Result<MarketOperationUtils> {
        let Some(sampler) = self.sampler else {
            return Err(eyre!("MarketOperationUtils requires a sampler"));
        };
        let mut utils = MarketOperationUtils::new(sampler, &self.config);
        if let Some(token_adjacency) = self.token_adjacency {
            utils.token_adjacency = token_adjacency;
        }
        if let Some(fill_optimizer) = self.fill_optimizer {
            utils.fill_optimizer = fill_optimizer;
        }
        Ok(utils)
    }
}

impl Default for MarketOperationUtilsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sync::{MockQuoteRequestor, MockSampler};
    use crate::logic::config::{FillOptimizerKind, RfqRequestOptions};
    use crate::logic::types::DexSample;
    use crate::utils::constants::WETH;

    fn token(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn pair_order(maker_token: Address, taker_token: Address) -> NativeOrder {
        NativeOrder::new_limit(maker_token, taker_token, U256::ZERO, U256::ZERO)
    }

    fn linear(source: LiquiditySource, rate_pct: u64) -> Vec<DexSample> {
        [250u64, 500, 750, 1_000].iter().map(|i| DexSample::new(source, U256::from(*i), U256::from(i * rate_pct / 100))).collect()
    }

    fn utils(sampler: MockSampler) -> eyre::Result<MarketOperationUtils> {
        MarketOperationUtilsBuilder::new()
            .with_sampler(Arc::new(sampler))
            .with_token_adjacency(TokenAdjacencyGraph::new(vec![token(9)]))
            .build()
    }

    #[test]
    fn test_builder_requires_sampler() {
        assert!(MarketOperationUtilsBuilder::new().build().is_err());
    }

    #[test]
    fn test_fill_optimizer_from_config() -> eyre::Result<()> {
        let config = OptimizerConfig { fill_optimizer: FillOptimizerKind::SampleRouter, ..OptimizerConfig::default() };
        let utils = MarketOperationUtilsBuilder::new().with_sampler(Arc::new(MockSampler::new(1))).with_config(config).build()?;
        assert_eq!(utils.fill_optimizer().kind(), FillOptimizerKind::SampleRouter);
        Ok(())
    }

    #[tokio::test]
    async fn test_market_side_liquidity_includes_bridge_legs() -> eyre::Result<()> {
        let sampler = MockSampler::new(1)
            .with_curve(MarketOperation::Sell, token(1), token(2), linear(LiquiditySource::UniswapV2, 90))
            .with_curve(MarketOperation::Sell, token(1), token(9), linear(LiquiditySource::UniswapV2, 200))
            .with_curve(MarketOperation::Sell, token(9), token(2), linear(LiquiditySource::Curve, 50))
            .with_price(token(1), token(9), 2.0)
            .with_price(token(9), token(2), 0.5)
            .with_price(WETH, token(1), 3.0);
        let utils = utils(sampler)?;

        let order = NativeOrder::new_limit(token(2), token(1), U256::from(100u64), U256::from(100u64));
        let msl = utils.get_market_side_liquidity(&[order], U256::from(1_000u64), MarketOperation::Sell, &GetMarketOrdersOpts::default()).await?;

        assert_eq!((msl.input_token, msl.output_token), (token(1), token(2)));
        assert_eq!(msl.quotes.len(), 3);
        let direct = msl.quotes.edge(token(1), token(2)).ok_or_else(|| eyre!("direct edge"))?;
        assert_eq!(direct.native_orders.len(), 1);
        assert_eq!(direct.native_orders[0].fillable_taker_amount, U256::from(100u64));
        assert!(msl.quotes.edge(token(1), token(9)).is_some());
        assert!(msl.quotes.edge(token(9), token(2)).is_some());
        assert_eq!(msl.amount_per_eth(token(1)), 3.0);
        assert_eq!(msl.amount_per_eth(token(9)), 0.0);
        assert!(!msl.is_rfq_supported);
        Ok(())
    }

    #[tokio::test]
    async fn test_buy_edges_are_maker_to_taker() -> eyre::Result<()> {
        let sampler = MockSampler::new(1).with_curve(MarketOperation::Buy, token(2), token(1), linear(LiquiditySource::UniswapV2, 110));
        let utils = utils(sampler)?;
        let msl = utils
            .get_market_side_liquidity(&[pair_order(token(2), token(1))], U256::from(1_000u64), MarketOperation::Buy, &GetMarketOrdersOpts::default())
            .await?;
        assert_eq!((msl.input_token, msl.output_token), (token(2), token(1)));
        assert_eq!(msl.taker_maker_tokens(), (token(1), token(2)));
        let direct = msl.quotes.edge(token(2), token(1)).ok_or_else(|| eyre!("direct edge"))?;
        assert_eq!(direct.dex_quotes.len(), 1);
        assert!(direct.native_orders.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_excluded_sources_are_not_sampled() -> eyre::Result<()> {
        let sampler = MockSampler::new(1)
            .with_curve(MarketOperation::Sell, token(1), token(2), linear(LiquiditySource::UniswapV2, 90))
            .with_curve(MarketOperation::Sell, token(1), token(2), linear(LiquiditySource::Curve, 95));
        let utils = utils(sampler)?;
        let config = OptimizerConfig {
            excluded_sources: vec![LiquiditySource::Curve, LiquiditySource::Native, LiquiditySource::MultiHop],
            ..OptimizerConfig::default()
        };
        let order = NativeOrder::new_limit(token(2), token(1), U256::from(100u64), U256::from(100u64));
        let msl = utils.get_market_side_liquidity(&[order], U256::from(1_000u64), MarketOperation::Sell, &GetMarketOrdersOpts::new(config)).await?;

        assert_eq!(msl.quotes.len(), 1);
        let direct = &msl.quotes.edges()[0];
        assert_eq!(direct.dex_quotes.len(), 1);
        assert_eq!(direct.dex_quotes[0][0].source, LiquiditySource::UniswapV2);
        assert!(direct.native_orders.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_route_through_bridge_beats_direct() -> eyre::Result<()> {
        let sampler = MockSampler::new(1)
            .with_curve(MarketOperation::Sell, token(1), token(2), linear(LiquiditySource::UniswapV2, 90))
            .with_curve(MarketOperation::Sell, token(1), token(9), linear(LiquiditySource::UniswapV2, 100))
            .with_curve(MarketOperation::Sell, token(9), token(2), linear(LiquiditySource::SushiSwap, 99))
            .with_price(token(1), token(9), 1.0)
            .with_price(token(9), token(2), 0.99);
        let utils = utils(sampler)?;
        let opts = GetMarketOrdersOpts::default();
        let result = utils.get_optimizer_result(&[pair_order(token(2), token(1))], U256::from(1_000u64), MarketOperation::Sell, &opts).await?;

        assert_eq!(result.result.hops.len(), 2);
        assert_eq!(result.result.input_token(), Some(token(1)));
        assert_eq!(result.result.output_token(), Some(token(2)));
        assert_eq!(result.result.output_amount(), U256::from(990u64));
        assert!(result.quote_report.is_none());
        assert!(result.price_comparisons_report.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_indicative_quotes_receive_comparison_price() -> eyre::Result<()> {
        let sampler = MockSampler::new(1).with_curve(MarketOperation::Sell, token(1), token(2), linear(LiquiditySource::UniswapV2, 90));
        let utils = utils(sampler)?;
        let requestor = Arc::new(MockQuoteRequestor::new().with_indicative_quotes(vec![IndicativeQuote {
            maker_token: token(2),
            taker_token: token(1),
            maker_amount: U256::from(1_000u64),
            taker_amount: U256::from(1_000u64),
            expiry: 0,
        }]));
        let options = RfqRequestOptions { is_indicative: true, ..RfqRequestOptions::default() };
        let config = OptimizerConfig { should_generate_quote_report: true, ..OptimizerConfig::default() };
        let opts = GetMarketOrdersOpts::new(config).with_rfqt(RfqtOpts::new(options, requestor.clone()));

        let result = utils.get_optimizer_result(&[pair_order(token(2), token(1))], U256::from(1_000u64), MarketOperation::Sell, &opts).await?;

        let requests = requestor.requests(RfqQuoteType::Indicative);
        assert_eq!(requests.len(), 1);
        let comparison_price = requests[0].comparison_price.ok_or_else(|| eyre!("comparison price"))?;
        assert!((comparison_price - 0.9).abs() < 1e-9);
        assert!(requestor.requests(RfqQuoteType::Firm).is_empty());

        assert_eq!(result.result.output_amount(), U256::from(1_000u64));
        let report = result.quote_report.ok_or_else(|| eyre!("quote report"))?;
        assert_eq!(report.hops[0].orders[0].source, LiquiditySource::Native);
        Ok(())
    }

    #[tokio::test]
    async fn test_rfq_skipped_when_native_excluded() -> eyre::Result<()> {
        let sampler = MockSampler::new(1).with_curve(MarketOperation::Sell, token(1), token(2), linear(LiquiditySource::UniswapV2, 90));
        let utils = utils(sampler)?;
        let requestor = Arc::new(MockQuoteRequestor::new());
        let config = OptimizerConfig { excluded_sources: vec![LiquiditySource::Native], ..OptimizerConfig::default() };
        let opts = GetMarketOrdersOpts::new(config).with_rfqt(RfqtOpts::new(RfqRequestOptions::default(), requestor.clone()));

        utils.get_optimizer_result(&[pair_order(token(2), token(1))], U256::from(1_000u64), MarketOperation::Sell, &opts).await?;
        assert!(requestor.requests(RfqQuoteType::Firm).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_sampler_error_propagates() -> eyre::Result<()> {
        let utils = utils(MockSampler::new(1).with_error("rpc unavailable"))?;
        let err = utils
            .get_optimizer_result(&[pair_order(token(2), token(1))], U256::from(1_000u64), MarketOperation::Sell, &GetMarketOrdersOpts::default())
            .await
            .err()
            .ok_or_else(|| eyre!("expected an error"))?;
        assert!(matches!(err, AggregationError::Collaborator(_)));
        assert_eq!(err.to_string(), "rpc unavailable");
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_orders() {
        let utils = MarketOperationUtils::new(Arc::new(MockSampler::new(1)), &OptimizerConfig::default());
        let result = utils.get_optimizer_result(&[], U256::from(1u64), MarketOperation::Sell, &GetMarketOrdersOpts::default()).await;
        assert!(matches!(result, Err(AggregationError::EmptyOrders)));
        let batch = utils.get_batch_market_orders(&[], MarketOperation::Sell, &GetMarketOrdersOpts::default()).await;
        assert!(matches!(batch, Err(AggregationError::EmptyOrders)));
    }
}
