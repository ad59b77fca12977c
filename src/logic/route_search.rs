use super::graph::QuoteGraph;
use super::hop_optimizer::{HopOptimizer, HopRequest};
use super::types::{MarketOperation, OptimizedHop, TokenAmountPerEth};
use alloy_primitives::{Address, U256};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Upper limit on expanded frames, the number of simple routes grows factorially with the edge count
const MAX_ROUTE_SEARCH_ITERATIONS: usize = 500_000;

/// Edge indices of one candidate route.
pub type EdgeRoute = Vec<usize>;

/// Branch of the route search.
#[derive(Debug)]
struct RouteState {
    route: EdgeRoute,
    // edges not used by this branch yet
    available: Vec<usize>,
    next: usize,
}

/// Every simple route of edges from `input_token` to `output_token`.
///
/// A branch stops at the first edge reaching `output_token`, a direct edge is a route
/// of its own. Edges are used at most once per branch. Routes are produced in the
/// order a depth-first walk over the graph's edge order finds them.
pub fn find_routes(graph: &QuoteGraph, input_token: Address, output_token: Address) -> Vec<EdgeRoute> {
    let edges = graph.edges();
    let mut routes: Vec<EdgeRoute> = Vec::new();
    let mut searched_counter = 0;

    for (first_idx, first_hop) in edges.iter().enumerate() {
        if first_hop.input_token != input_token {
            continue;
        }
        if first_hop.output_token == output_token {
            routes.push(vec![first_idx]);
            continue;
        }

        let mut stack = vec![RouteState {
            route: vec![first_idx],
            available: (0..edges.len()).filter(|&i| i != first_idx).collect(),
            next: 0,
        }];

        while let Some(state) = stack.last_mut() {
            if searched_counter > MAX_ROUTE_SEARCH_ITERATIONS {
                warn!(%input_token, %output_token, edges = edges.len(), "Route search too many iterations");
                return routes;
            }
            searched_counter += 1;

            let Some(&last_idx) = state.route.last() else {
                stack.pop();
                continue;
            };
            let last_output = edges[last_idx].output_token;

            let mut child = None;
            while state.next < state.available.len() {
                let pos = state.next;
                state.next += 1;
                let edge_idx = state.available[pos];
                let hop = &edges[edge_idx];
                if hop.input_token != last_output {
                    continue;
                }
                let mut route = state.route.clone();
                route.push(edge_idx);
                if hop.output_token == output_token {
                    routes.push(route);
                    continue;
                }
                let mut available = state.available.clone();
                available.remove(pos);
                child = Some(RouteState { route, available, next: 0 });
                break;
            }

            match child {
                Some(child) => stack.push(child),
                None => {
                    stack.pop();
                }
            }
        }
    }

    routes
}

/// Best routes first: by final output descending, reversed for buys where the final
/// output is the cost.
pub fn rank_hop_routes(side: MarketOperation, mut hop_routes: Vec<Vec<OptimizedHop>>) -> Vec<Vec<OptimizedHop>> {
    hop_routes.retain(|route| !route.is_empty());
    hop_routes.sort_by(|a, b| {
        let a_output = a.last().map(|hop| hop.output_amount).unwrap_or_default();
        let b_output = b.last().map(|hop| hop.output_amount).unwrap_or_default();
        b_output.cmp(&a_output)
    });
    if side == MarketOperation::Buy {
        hop_routes.reverse();
    }
    hop_routes
}

/// Chains the hop optimizer across every candidate route and keeps the best one.
#[derive(Debug, Clone)]
pub struct HopRouteSearch {
    hop_optimizer: HopOptimizer,
    enable_parallel_route_search: bool,
}

impl HopRouteSearch {
    pub fn new(hop_optimizer: HopOptimizer, enable_parallel_route_search: bool) -> Self {
        Self { hop_optimizer, enable_parallel_route_search }
    }

    /// Optimizes the hops of one route in order, each hop consuming the previous
    /// hop's output. `None` if any hop cannot be filled.
    pub fn optimize_route(
        &self,
        side: MarketOperation,
        route: &[usize],
        input_amount: U256,
        graph: &QuoteGraph,
        token_amount_per_eth: &TokenAmountPerEth,
    ) -> Option<Vec<OptimizedHop>> {
        let mut hop_input_amount = input_amount;
        let mut hops = Vec::with_capacity(route.len());
        for &edge_idx in route {
            let quotes = graph.edges().get(edge_idx)?;
            let request = HopRequest {
                side,
                input_token: quotes.input_token,
                output_token: quotes.output_token,
                input_amount: hop_input_amount,
                dex_quotes: &quotes.dex_quotes,
                native_orders: &quotes.native_orders,
                input_amount_per_eth: token_amount_per_eth.get(&quotes.input_token).copied().unwrap_or(0.0),
                output_amount_per_eth: token_amount_per_eth.get(&quotes.output_token).copied().unwrap_or(0.0),
            };
            let Some(hop) = self.hop_optimizer.create_optimized_hop(&request) else {
                debug!(input_token = %quotes.input_token, output_token = %quotes.output_token, %hop_input_amount, "Route dropped, hop not fillable");
                return None;
            };
            hop_input_amount = hop.output_amount;
            hops.push(hop);
        }
        Some(hops)
    }

    pub fn find_best_optimized_hop_route(
        &self,
        side: MarketOperation,
        input_token: Address,
        output_token: Address,
        input_amount: U256,
        graph: &QuoteGraph,
        token_amount_per_eth: &TokenAmountPerEth,
    ) -> Option<Vec<OptimizedHop>> {
        let routes = find_routes(graph, input_token, output_token);
        debug!(%input_token, %output_token, routes = routes.len(), edges = graph.len(), "Enumerated hop routes");

        let optimize = |route: &EdgeRoute| self.optimize_route(side, route, input_amount, graph, token_amount_per_eth);
        let hop_routes: Vec<Vec<OptimizedHop>> = if self.enable_parallel_route_search {
            routes.par_iter().filter_map(optimize).collect()
        } else {
            routes.iter().filter_map(optimize).collect()
        };

        rank_hop_routes(side, hop_routes).into_iter().next()
    }
}
