//! Building blocks for small 2D games drawn in the terminal.
//!
//! - [`core`]: tile grid and the [`MapRead`](core::MapRead) view renderers consume
//! - [`tilemap`]: tilesets cut from an image and grids of tile indices
//! - [`viewport`]: pan/zoom camera mapping screen space to world space
//! - [`aseprite`]: Aseprite sheet import and an animated sprite
//! - [`mapgen`]: drunk walk, Voronoi and charge-field generators
//! - `render` (feature `ratatui`): drawing all of the above into a ratatui frame

pub mod aseprite;
pub mod core;
pub mod mapgen;
pub mod parse;
pub mod prelude;
pub mod procgen;
#[cfg(feature = "ratatui")]
pub mod render;
pub mod tilemap;
pub mod viewport;
