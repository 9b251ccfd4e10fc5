//! Shared test utilities for the deck-save-butler workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`game`]: [`TestGame`] fixture with PC, Deck and state directories

pub mod game;

pub use game::{TestGame, at};
