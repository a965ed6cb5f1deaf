//! Configuration for burrow, read from `burrow.toml`.
//!
//! - [load]: locating, parsing and generating the config file ([Config], [RawConfig]).
//! - [general]: the `[general]` table (hidden files, initial sort, hand-off file, icons).
//! - [input]: the `[keys]`, `[tools]` and `[input]` tables.

pub mod general;
pub mod input;
pub mod load;

pub use general::{General, InternalGeneral};
pub use input::{Input, Keys, Tools};
pub use load::{Config, RawConfig};
