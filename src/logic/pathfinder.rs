use super::graph::{TokenAdjacencyGraph, TokenPathSet};
use alloy_primitives::Address;
use tracing::{debug, warn};

/// Upper limit on expanded frames, guards against a malformed adjacency graph
const MAX_SEARCH_ITERATIONS: usize = 500_000;

/// How a path found for an inner token pair is lifted into its parent pair.
#[derive(Debug, Clone, Copy)]
struct Wrap {
    // endpoints of the parent pair, an inner path may not revisit them
    outer_taker: Address,
    outer_maker: Address,
    // the short hop the inner pair was derived from
    hop_taker: Address,
    hop_maker: Address,
}

impl Wrap {
    fn apply(&self, mut path: Vec<Address>) -> Option<Vec<Address>> {
        if path.contains(&self.outer_taker) || path.contains(&self.outer_maker) {
            return None;
        }
        if path.first() == Some(&self.hop_taker) {
            path.push(self.hop_maker);
        } else {
            path.insert(0, self.hop_taker);
        }
        Some(path)
    }
}

/// One pending token pair of the search.
#[derive(Debug)]
struct PathState {
    taker: Address,
    maker: Address,
    max_path_length: usize,
    // outermost first
    wraps: Vec<Wrap>,
}

/// Enumerates the intermediate token paths a swap may be routed through.
pub struct Pathfinder {
    /// Longest token path searched, the endpoints included
    max_path_length: usize,
}

impl Pathfinder {
    pub fn new(max_path_length: usize) -> Self {
        Self { max_path_length }
    }

    pub fn max_path_length(&self) -> usize {
        self.max_path_length
    }

    /// Every distinct token path between `taker_token` and `maker_token` made of
    /// bridge hops found in `adjacency`.
    ///
    /// For each bridge token `t` the short hops `[taker, t]` and `[t, maker]` are
    /// produced, then each short hop is searched again with one less token of depth.
    /// Inner paths touching the outer pair are dropped. The search is depth-first
    /// with an explicit stack and yields paths in pre-order, first occurrence kept.
    pub fn intermediate_token_paths(&self, adjacency: &TokenAdjacencyGraph, taker_token: Address, maker_token: Address) -> Vec<Vec<Address>> {
        let mut all_paths = TokenPathSet::new();
        let mut stack = vec![PathState { taker: taker_token, maker: maker_token, max_path_length: self.max_path_length, wraps: vec![] }];

        let mut searched_counter = 0;

        while let Some(PathState { taker, maker, max_path_length, wraps }) = stack.pop() {
            if searched_counter > MAX_SEARCH_ITERATIONS {
                warn!(%taker_token, %maker_token, max_path_length = self.max_path_length, "Intermediate token search too many iterations");
                break;
            }
            searched_counter += 1;

            if max_path_length < 2 {
                continue;
            }

            let short_hops: Vec<(Address, Address)> = adjacency
                .intermediate_tokens(maker, taker)
                .into_iter()
                .flat_map(|token| [(taker, token), (token, maker)])
                .collect();

            for &(hop_taker, hop_maker) in short_hops.iter() {
                let lifted = wraps.iter().rev().try_fold(vec![hop_taker, hop_maker], |path, wrap| wrap.apply(path));
                if let Some(path) = lifted {
                    all_paths.insert(path);
                }
            }

            // reversed so that the first short hop is expanded first
            for &(hop_taker, hop_maker) in short_hops.iter().rev() {
                let mut child_wraps = wraps.clone();
                child_wraps.push(Wrap { outer_taker: taker, outer_maker: maker, hop_taker, hop_maker });
                stack.push(PathState { taker: hop_taker, maker: hop_maker, max_path_length: max_path_length - 1, wraps: child_wraps });
            }
        }

        debug!(%taker_token, %maker_token, paths = all_paths.len(), "Found intermediate token paths");
        all_paths.vec()
    }
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new(3)
    }
}
