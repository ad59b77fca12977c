pub mod amounts;
pub mod config_loader;
pub mod constants;
pub mod token;

pub use amounts::*;
pub use config_loader::*;
pub use constants::*;
pub use token::Token;
