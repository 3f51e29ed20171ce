//! Player card PNG generation.
//!
//! A loosely-typed JSON record describing a player goes in; a PNG card with
//! the player's photo, header, summary line and stat bars comes out.

pub mod compositor;
pub mod config;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod photo;
pub mod pipeline;
pub mod render;
pub mod theme;

pub use config::Settings;
pub use error::{CardError, Result};
pub use model::{CardModel, StatKind, normalize};
pub use pipeline::CardPipeline;
pub use theme::Theme;
