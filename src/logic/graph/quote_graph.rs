use crate::logic::types::{HopQuotes, NativeOrderWithFillableAmounts};
use alloy_primitives::Address;

/// Edge set of sampled liquidity between token pairs.
///
/// A graph is a snapshot: adding liquidity produces a new graph and leaves the
/// original untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuoteGraph {
    edges: Vec<HopQuotes>,
}

impl QuoteGraph {
    pub fn new(edges: Vec<HopQuotes>) -> Self {
        Self { edges }
    }

    pub fn edges(&self) -> &[HopQuotes] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge(&self, input_token: Address, output_token: Address) -> Option<&HopQuotes> {
        self.edges.iter().find(|hop| hop.connects(input_token, output_token))
    }

    /// Copy of this graph with `orders` appended to every `input -> output` edge,
    /// or to a new edge if there is none.
    pub fn with_native_orders(&self, input_token: Address, output_token: Address, orders: &[NativeOrderWithFillableAmounts]) -> Self {
        let mut edges = self.edges.clone();
        let mut matched = false;
        for hop in edges.iter_mut().filter(|hop| hop.connects(input_token, output_token)) {
            hop.native_orders.extend_from_slice(orders);
            matched = true;
        }
        if !matched {
            edges.push(HopQuotes::new(input_token, output_token).with_native_orders(orders.to_vec()));
        }
        Self { edges }
    }
}

impl From<Vec<HopQuotes>> for QuoteGraph {
    fn from(edges: Vec<HopQuotes>) -> Self {
        Self::new(edges)
    }
}
