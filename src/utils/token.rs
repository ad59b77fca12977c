use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Token metadata as reported by the sampler. Identity is the address only, so two
/// tokens parsed from differently cased hex strings compare equal.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Token {
    address: Address,
    decimals: u8,
    symbol: Option<String>,
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.get_address()
    }
}

impl Eq for Token {}

impl Token {
    pub fn new(address: Address) -> Token {
        Token { address, decimals: 18, symbol: None }
    }

    pub fn new_with_data(address: Address, symbol: Option<String>, decimals: Option<u8>) -> Token {
        Token { address, symbol, decimals: decimals.unwrap_or(18) }
    }

    pub fn get_symbol(&self) -> String {
        self.symbol.clone().unwrap_or(self.address.to_string())
    }

    pub fn get_decimals(&self) -> u8 {
        self.decimals
    }

    pub fn get_address(&self) -> Address {
        self.address
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::constants::WETH;

    #[test]
    fn test_serialize() {
        let weth_token = Token::new_with_data(WETH, Some("WETH".to_string()), Some(18));

        let serialized = serde_json::to_string(&weth_token).unwrap();
        assert_eq!(serialized, "{\"address\":\"0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2\",\"decimals\":18,\"symbol\":\"WETH\"}");
    }

    #[test]
    fn test_address_identity_ignores_case() {
        let lower: Address = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().unwrap();
        let mixed: Address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".parse().unwrap();
        assert_eq!(Token::new(lower), Token::new(mixed));
    }

    #[test]
    fn test_symbol_defaults_to_address() {
        let usdc = Token::new_with_data(Address::repeat_byte(1), None, Some(6));
        assert_eq!(usdc.get_symbol(), Address::repeat_byte(1).to_string());
        assert_eq!(usdc.get_decimals(), 6);
        assert_eq!(Token::new(WETH).get_decimals(), 18);
    }
}
