//! Procedural map generators.
//!
//! Each generator is usable on its own (the `DrunkWalk`, `Voronoi` and
//! `ChargeField` types expose their intermediate data) and also through the
//! [`MapGenerator`](crate::procgen::MapGenerator) contract, which wraps the
//! result in a fingerprinted [`GeneratedMap`](crate::procgen::GeneratedMap).

pub mod charge;
pub mod drunkwalk;
pub mod voronoi;

pub use charge::{Charge, ChargeField, ChargeGenerator, ChargeParams};
pub use drunkwalk::{
    DrunkWalk, DrunkWalkGenerator, DrunkWalkParams, BASIC_INTERSECTION, FULL_INTERSECTION,
    NO_INTERSECTION,
};
pub use voronoi::{Area, Voronoi, VoronoiGenerator, VoronoiParams};

use crate::core::MapSize;
use crate::procgen::GenError;

pub(crate) fn checked_size(width: u16, height: u16) -> Result<MapSize, GenError> {
    let size = MapSize::new(width, height);
    if size.is_empty() {
        return Err(GenError::InvalidSize);
    }
    Ok(size)
}

pub(crate) const NEIGHBOURS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
