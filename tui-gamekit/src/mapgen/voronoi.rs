use std::collections::{BTreeMap, HashSet};

use crate::core::{MapGrid, MapSize, TileKind};
use crate::procgen::{
    AnchorKind, GenError, GenerateRequest, GeneratedMap, MapGenerator, SeededRng, SpawnAnchor,
};

use super::{checked_size, NEIGHBOURS_8};

const UNCLAIMED: u32 = 0;

/// One Voronoi cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Area {
    pub id: u32,
    pub origin: (u16, u16),
    /// Claimed positions in claim order.
    pub positions: Vec<(u16, u16)>,
    /// Ids of touching areas, sorted.
    pub neighbours: Vec<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoronoiParams {
    pub seed_count: u32,
}

impl Default for VoronoiParams {
    fn default() -> Self {
        Self { seed_count: 10 }
    }
}

/// Flat Voronoi partition grown from random seed points.
///
/// All areas grow one ring (8-neighbourhood) per round, so each cell ends
/// up with the area that reached it first; ties go to the lower id.
#[derive(Clone, Debug)]
pub struct Voronoi {
    size: MapSize,
    cells: Vec<u32>,
    areas: BTreeMap<u32, Area>,
}

impl Voronoi {
    pub fn new(seed: u64, seed_count: u32, size: MapSize) -> Result<Self, GenError> {
        if size.is_empty() {
            return Err(GenError::InvalidSize);
        }
        if seed_count == 0 || seed_count > u16::MAX as u32 {
            return Err(GenError::InvalidParams(format!(
                "seed count {seed_count} outside 1..={}",
                u16::MAX
            )));
        }

        let mut rng = SeededRng::new(seed);
        let mut voronoi = Self {
            size,
            cells: vec![UNCLAIMED; size.tile_count()],
            areas: BTreeMap::new(),
        };

        let mut frontier = Vec::with_capacity(seed_count as usize);
        for id in 1..=seed_count {
            let origin = (
                rng.range_inclusive(0, size.width as i64 - 1) as u16,
                rng.range_inclusive(0, size.height as i64 - 1) as u16,
            );
            voronoi.areas.insert(
                id,
                Area {
                    id,
                    origin,
                    positions: Vec::new(),
                    neighbours: Vec::new(),
                },
            );
            frontier.push((id, vec![origin]));
        }

        voronoi.grow(frontier);
        voronoi.link_neighbours();

        log::debug!(
            "voronoi {}x{} grown from {} seeds",
            size.width,
            size.height,
            seed_count
        );
        Ok(voronoi)
    }

    fn grow(&mut self, mut frontier: Vec<(u32, Vec<(u16, u16)>)>) {
        while !frontier.is_empty() {
            let mut next_round = Vec::new();

            for (id, positions) in frontier {
                let mut queued = HashSet::new();
                let mut next_positions = Vec::new();

                for (x, y) in positions {
                    let idx = y as usize * self.size.width as usize + x as usize;
                    let owner = self.cells[idx];
                    let Some(area) = self.areas.get_mut(&id) else {
                        continue;
                    };

                    if owner == UNCLAIMED {
                        self.cells[idx] = id;
                        area.positions.push((x, y));
                        for (dx, dy) in NEIGHBOURS_8 {
                            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                            if !self.size.contains(nx, ny) {
                                continue;
                            }
                            let pos = (nx as u16, ny as u16);
                            if queued.insert(pos) {
                                next_positions.push(pos);
                            }
                        }
                    } else if owner != id && !area.neighbours.contains(&owner) {
                        area.neighbours.push(owner);
                    }
                }

                if !next_positions.is_empty() {
                    next_round.push((id, next_positions));
                }
            }

            frontier = next_round;
        }
    }

    /// Makes the neighbour relation symmetric and sorted.
    fn link_neighbours(&mut self) {
        let pairs: Vec<(u32, u32)> = self
            .areas
            .values()
            .flat_map(|area| area.neighbours.iter().map(move |other| (area.id, *other)))
            .collect();

        for (a, b) in pairs {
            if let Some(area) = self.areas.get_mut(&b) {
                if !area.neighbours.contains(&a) {
                    area.neighbours.push(a);
                }
            }
        }
        for area in self.areas.values_mut() {
            area.neighbours.sort_unstable();
        }
    }

    pub fn size(&self) -> MapSize {
        self.size
    }

    /// Area id at a position, `None` off the map.
    pub fn area_at(&self, x: i32, y: i32) -> Option<u32> {
        if !self.size.contains(x, y) {
            return None;
        }
        let idx = y as usize * self.size.width as usize + x as usize;
        Some(self.cells[idx])
    }

    pub fn area(&self, id: u32) -> Option<&Area> {
        self.areas.get(&id)
    }

    /// Positions of an area; empty for unknown ids.
    pub fn positions_of(&self, id: u32) -> &[(u16, u16)] {
        self.areas
            .get(&id)
            .map(|area| area.positions.as_slice())
            .unwrap_or(&[])
    }

    pub fn areas(&self) -> impl Iterator<Item = &Area> {
        self.areas.values()
    }

    pub fn to_grid(&self, name: impl Into<String>) -> MapGrid {
        let tiles = self
            .cells
            .iter()
            .map(|id| match *id {
                UNCLAIMED => TileKind::Void,
                id => TileKind::Custom(id as u16),
            })
            .collect();
        MapGrid {
            name: name.into(),
            size: self.size,
            tiles,
        }
    }
}

pub struct VoronoiGenerator;

impl MapGenerator<VoronoiParams> for VoronoiGenerator {
    fn id(&self) -> &'static str {
        "voronoi"
    }

    fn version(&self) -> u32 {
        1
    }

    fn generate(&self, req: &GenerateRequest<VoronoiParams>) -> Result<GeneratedMap, GenError> {
        let size = checked_size(req.width, req.height)?;
        let voronoi = Voronoi::new(req.seed, req.params.seed_count, size)?;

        let anchors = voronoi
            .areas()
            .map(|area| SpawnAnchor {
                kind: AnchorKind::Custom("area_origin".to_string()),
                x: area.origin.0,
                y: area.origin.1,
                tag: Some(area.id.to_string()),
            })
            .collect();

        Ok(GeneratedMap::with_computed_fingerprint(
            self.id(),
            self.version(),
            req.seed,
            voronoi.to_grid("voronoi"),
            anchors,
        ))
    }
}
