use crate::utils::constants::default_intermediate_tokens;
use ahash::RandomState;
use alloy_primitives::Address;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type FastHasher = RandomState;
/// FastHashMap using ahash
pub type FastHashMap<K, V> = HashMap<K, V, FastHasher>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenNode {
    pub address: Address,
    // Set once the token has its own adjacency list. Tokens only reached as
    // neighbours fall back to the default list.
    pub has_entry: bool,
}

impl TokenNode {
    pub fn new(address: Address) -> Self {
        Self { address, has_entry: false }
    }
}

/// Intermediate token file format.
///
/// ```toml
/// default = ["0xc02a..."]
///
/// [tokens]
/// "0x6b17..." = ["0xa0b8...", "0xdac1..."]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenAdjacencyConfig {
    #[serde(default)]
    pub default: Vec<Address>,
    #[serde(default)]
    pub tokens: HashMap<Address, Vec<Address>>,
}

/// For each token, the ordered list of tokens worth routing through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenAdjacencyGraph {
    // Edge weight is the insertion ordinal so adjacency lists keep their order
    pub graph: DiGraph<TokenNode, usize, usize>,
    // token -> node index
    pub token_index: FastHashMap<Address, NodeIndex<usize>>,
    pub default_tokens: Vec<Address>,
}

impl TokenAdjacencyGraph {
    pub fn new(default_tokens: Vec<Address>) -> Self {
        Self { graph: DiGraph::default(), token_index: FastHashMap::default(), default_tokens }
    }

    pub fn for_chain(chain_id: u64) -> Self {
        Self::new(default_intermediate_tokens(chain_id))
    }

    pub fn from_config(config: TokenAdjacencyConfig) -> Self {
        let mut graph = Self::new(config.default);
        for (token, adjacent) in config.tokens {
            graph.add_adjacent(token, &adjacent);
        }
        graph
    }

    pub fn add_or_get_token_idx(&mut self, address: Address) -> NodeIndex<usize> {
        if let Some(&idx) = self.token_index.get(&address) {
            return idx;
        }
        let idx = self.graph.add_node(TokenNode::new(address));
        self.token_index.insert(address, idx);
        idx
    }

    /// Appends `adjacent` to the adjacency list of `token`, skipping tokens already listed.
    pub fn add_adjacent(&mut self, token: Address, adjacent: &[Address]) {
        let from = self.add_or_get_token_idx(token);
        self.graph[from].has_entry = true;
        for &next in adjacent {
            let to = self.add_or_get_token_idx(next);
            if self.graph.find_edge(from, to).is_some() {
                continue;
            }
            let ordinal = self.graph.edge_count();
            self.graph.add_edge(from, to, ordinal);
        }
    }

    /// Adjacency list of `token`, or the default list if the token has none.
    pub fn adjacent_tokens(&self, token: Address) -> Vec<Address> {
        let Some(&idx) = self.token_index.get(&token) else {
            return self.default_tokens.clone();
        };
        if !self.graph[idx].has_entry {
            return self.default_tokens.clone();
        }
        let mut edges: Vec<(usize, Address)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (*edge.weight(), self.graph[edge.target()].address))
            .collect();
        edges.sort_unstable_by_key(|(ordinal, _)| *ordinal);
        edges.into_iter().map(|(_, address)| address).collect()
    }

    /// Tokens adjacent to both `maker_token` and `taker_token`, in the taker's list order.
    pub fn intermediate_tokens(&self, maker_token: Address, taker_token: Address) -> Vec<Address> {
        let maker_adjacent = self.adjacent_tokens(maker_token);
        let mut result: Vec<Address> = Vec::new();
        for token in self.adjacent_tokens(taker_token) {
            if token == maker_token || token == taker_token {
                continue;
            }
            if maker_adjacent.contains(&token) && !result.contains(&token) {
                result.push(token);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list_for_unknown_tokens() {
        let (a, b, weth) = (Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(9));
        let graph = TokenAdjacencyGraph::new(vec![weth]);
        assert_eq!(graph.adjacent_tokens(a), vec![weth]);
        assert_eq!(graph.intermediate_tokens(a, b), vec![weth]);
    }

    #[test]
    fn test_adjacency_order_is_preserved() {
        let (a, x, y, z) = (Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3), Address::repeat_byte(4));
        let mut graph = TokenAdjacencyGraph::new(vec![]);
        graph.add_adjacent(a, &[z, x]);
        graph.add_adjacent(a, &[y, x]);
        assert_eq!(graph.adjacent_tokens(a), vec![z, x, y]);
        // z only appears as a neighbour
        assert!(graph.adjacent_tokens(z).is_empty());
    }

    #[test]
    fn test_intermediate_tokens_exclude_endpoints() {
        let (maker, taker, x, y) = (Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3), Address::repeat_byte(4));
        let mut graph = TokenAdjacencyGraph::new(vec![]);
        graph.add_adjacent(taker, &[maker, y, x]);
        graph.add_adjacent(maker, &[x, taker, y]);
        assert_eq!(graph.intermediate_tokens(maker, taker), vec![y, x]);
    }

    #[test]
    fn test_from_toml_config() -> eyre::Result<()> {
        let config: TokenAdjacencyConfig = toml::from_str(
            r#"
            default = ["0x0101010101010101010101010101010101010101"]

            [tokens]
            "0x0202020202020202020202020202020202020202" = ["0x0303030303030303030303030303030303030303"]
            "#,
        )?;
        let graph = TokenAdjacencyGraph::from_config(config);
        assert_eq!(graph.adjacent_tokens(Address::repeat_byte(2)), vec![Address::repeat_byte(3)]);
        assert_eq!(graph.adjacent_tokens(Address::repeat_byte(5)), vec![Address::repeat_byte(1)]);
        Ok(())
    }
}
