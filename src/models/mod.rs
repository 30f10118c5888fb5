//! Core data models for deck and corpus analysis.

mod card;
mod deck;
mod fingerprint;
mod placement;
mod stats;

pub use card::*;
pub use deck::*;
pub use fingerprint::*;
pub use placement::*;
pub use stats::*;
