pub mod api;
pub mod assembler;
pub mod autocomplete;
pub mod balance;
pub mod cache;
pub mod card;
pub mod collection;
pub mod commander;
pub mod config;
pub mod deck;
pub mod error;
pub mod identity;
pub mod mana;
pub mod matchers;
pub mod pool;
pub mod scoring;

pub use assembler::{DeckAssembler, GenerationToken, Stage};
pub use config::DeckConfig;
pub use deck::Deck;
pub use error::{DeckError, DeckResult};
