use alloy_primitives::{Address, address};

pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

pub const WMNT: Address = address!("0x78c1b0c915c4faa5fffa6cabf0219da63d7f4cb8");

pub const MAINNET_CHAIN_ID: u64 = 1;
pub const MANTLE_CHAIN_ID: u64 = 5000;

/// Gas attributed to filling one resting limit order.
pub const LIMIT_ORDER_GAS: u64 = 135_000;
/// Gas attributed to filling one RFQ order.
pub const RFQ_ORDER_GAS: u64 = 100_000;

#[non_exhaustive]
pub struct MainnetTokenAddress;

impl MainnetTokenAddress {
    pub const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    pub const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    pub const USDT: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
    pub const WBTC: Address = address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599");
}

/// The wrapped native token used to express gas costs on a chain.
pub fn native_fee_token(chain_id: u64) -> Option<Address> {
    match chain_id {
        MAINNET_CHAIN_ID => Some(WETH),
        MANTLE_CHAIN_ID => Some(WMNT),
        _ => None,
    }
}

/// Bridge tokens considered for every pair unless the adjacency graph says otherwise.
pub fn default_intermediate_tokens(chain_id: u64) -> Vec<Address> {
    match chain_id {
        MAINNET_CHAIN_ID => vec![
            WETH,
            MainnetTokenAddress::USDC,
            MainnetTokenAddress::DAI,
            MainnetTokenAddress::USDT,
            MainnetTokenAddress::WBTC,
        ],
        MANTLE_CHAIN_ID => vec![WMNT],
        _ => vec![],
    }
}
