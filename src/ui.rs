//! Terminal UI for burrow.
//!
//! - [render]: the per-frame entry point and the listing.
//! - [widgets]: dialog primitives and the popups drawn with them.
//! - [icons]: entry category tags with icon and color.
//! - [overlays]: the stack of messages and help shown above the listing.

pub mod icons;
pub mod overlays;
pub mod render;
pub mod widgets;

pub use render::render;
