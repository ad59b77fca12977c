pub mod quote_graph;
pub mod token_adjacency_graph;
pub mod token_path_set;

pub use quote_graph::QuoteGraph;
pub use token_adjacency_graph::{TokenAdjacencyConfig, TokenAdjacencyGraph};
pub use token_path_set::TokenPathSet;
