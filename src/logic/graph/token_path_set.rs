use alloy_primitives::Address;
use std::collections::HashSet;

/// Token paths in first-seen order, without positional duplicates.
#[derive(Debug, Default)]
pub struct TokenPathSet {
    paths: Vec<Vec<Address>>,
    seen: HashSet<Vec<Address>>,
}

impl TokenPathSet {
    pub fn new() -> TokenPathSet {
        TokenPathSet::default()
    }

    /// Returns false if an identical path was already present.
    pub fn insert(&mut self, path: Vec<Address>) -> bool {
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    pub fn extend(&mut self, paths: Vec<Vec<Address>>) {
        for path in paths {
            self.insert(path);
        }
    }

    pub fn vec(self) -> Vec<Vec<Address>> {
        self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_path_set() {
        let (a, b, c) = (Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3));

        let mut set = TokenPathSet::new();
        set.extend(vec![vec![a, b], vec![b, c], vec![a, b, c]]);
        // second time should not add anything
        set.extend(vec![vec![a, b], vec![b, c]]);

        assert_eq!(set.len(), 3);
        assert_eq!(set.vec(), vec![vec![a, b], vec![b, c], vec![a, b, c]]);
    }

    #[test]
    fn test_prefix_is_not_a_duplicate() {
        let (a, b, c) = (Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3));
        let mut set = TokenPathSet::new();
        assert!(set.insert(vec![a, b]));
        assert!(set.insert(vec![a, b, c]));
        assert!(!set.insert(vec![a, b]));
    }
}
