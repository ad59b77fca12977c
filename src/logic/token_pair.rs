use super::types::MarketOperation;
use alloy_primitives::Address;

/// (taker, maker) of a token path: its first and last token.
pub fn taker_maker_tokens_from_path(token_path: &[Address]) -> Option<(Address, Address)> {
    Some((*token_path.first()?, *token_path.last()?))
}

/// (input, output) of a token path for a trade side. Buys consume the maker token.
pub fn input_output_tokens_from_path(side: MarketOperation, token_path: &[Address]) -> Option<(Address, Address)> {
    let (taker, maker) = taker_maker_tokens_from_path(token_path)?;
    Some(input_output_from_taker_maker(side, taker, maker))
}

/// (taker, maker) for an (input, output) pair on a trade side.
pub fn taker_maker_from_input_output(side: MarketOperation, input_token: Address, output_token: Address) -> (Address, Address) {
    match side {
        MarketOperation::Sell => (input_token, output_token),
        MarketOperation::Buy => (output_token, input_token),
    }
}

/// (input, output) for a (taker, maker) pair on a trade side.
pub fn input_output_from_taker_maker(side: MarketOperation, taker_token: Address, maker_token: Address) -> (Address, Address) {
    match side {
        MarketOperation::Sell => (taker_token, maker_token),
        MarketOperation::Buy => (maker_token, taker_token),
    }
}
