use crate::core::{MapGrid, MapSize, TileKind};
use crate::procgen::{
    AnchorKind, GenError, GenerateRequest, GeneratedMap, MapGenerator, SeededRng, SpawnAnchor,
};

use super::{checked_size, NEIGHBOURS_8};

/// The walker never steps onto an already visited tile.
pub const NO_INTERSECTION: f64 = 0.0;
/// The walker re-enters visited tiles three times out of four.
pub const BASIC_INTERSECTION: f64 = 0.75;
/// The walker always re-enters visited tiles.
pub const FULL_INTERSECTION: f64 = 1.0;

const DIRECTIONS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrunkWalkParams {
    /// Chance in `0.0..=1.0` of stepping onto a tile that is not `Void`.
    pub intersection_allowance: f64,
    /// `None` walks until the walker gets stuck.
    pub max_steps: Option<u32>,
}

impl Default for DrunkWalkParams {
    fn default() -> Self {
        Self {
            intersection_allowance: BASIC_INTERSECTION,
            max_steps: None,
        }
    }
}

impl DrunkWalkParams {
    fn validate(&self) -> Result<(), GenError> {
        let allowance = self.intersection_allowance;
        if !(NO_INTERSECTION..=FULL_INTERSECTION).contains(&allowance) {
            return Err(GenError::InvalidParams(format!(
                "intersection allowance {allowance} outside 0.0..=1.0"
            )));
        }
        if self.max_steps.is_none() && allowance >= FULL_INTERSECTION {
            return Err(GenError::InvalidParams(
                "an unlimited walk with full intersection never ends".to_string(),
            ));
        }
        Ok(())
    }
}

/// Random-walk cave carver.
///
/// The walk starts from the middle of the area and turns `Void` into
/// `Floor`; [`generate_walls`](Self::generate_walls) then outlines the result.
/// Several walks can be layered on the same area.
#[derive(Clone, Debug)]
pub struct DrunkWalk {
    grid: MapGrid,
    rng: SeededRng,
}

impl DrunkWalk {
    pub fn new(seed: u64, size: MapSize) -> Self {
        Self {
            grid: MapGrid::filled("drunkwalk", size, TileKind::Void),
            rng: SeededRng::new(seed),
        }
    }

    /// Runs one walk and returns the number of steps taken.
    pub fn generate_floor(&mut self, params: &DrunkWalkParams) -> Result<u32, GenError> {
        params.validate()?;
        if self.grid.size.is_empty() {
            return Err(GenError::InvalidSize);
        }

        let mut x = (self.grid.width() / 2) as i32;
        let mut y = (self.grid.height() / 2) as i32;
        self.grid.set_tile(x as u16, y as u16, TileKind::Floor);

        let mut remaining = params.max_steps;
        let mut steps = 0u32;

        loop {
            if remaining == Some(0) {
                break;
            }

            let mut candidates = DIRECTIONS.to_vec();
            let mut moved = false;
            while !candidates.is_empty() {
                let pick = self.rng.next_bounded(candidates.len() as u64) as usize;
                let (dx, dy) = candidates.remove(pick);
                let (nx, ny) = (x + dx, y + dy);

                let Some(target) = self.grid.tile_at_signed(nx, ny) else {
                    continue;
                };

                if target.is_void()
                    || (params.intersection_allowance != NO_INTERSECTION
                        && self.rng.next_f64() <= params.intersection_allowance)
                {
                    x = nx;
                    y = ny;
                    self.grid.set_tile(x as u16, y as u16, TileKind::Floor);
                    moved = true;
                    break;
                }
            }

            if let Some(left) = remaining.as_mut() {
                *left -= 1;
            }
            if !moved {
                break;
            }
            steps += 1;
        }

        log::debug!(
            "drunk walk took {steps} steps, {} floor tiles",
            self.grid.count(TileKind::Floor)
        );
        Ok(steps)
    }

    /// Marks every `Void` tile touching a `Floor` tile (8-neighbourhood) as `Wall`.
    pub fn generate_walls(&mut self) {
        let mut walls = Vec::new();
        for (x, y, tile) in self.grid.iter() {
            if !tile.is_void() {
                continue;
            }
            let touches_floor = NEIGHBOURS_8.iter().any(|(dx, dy)| {
                self.grid.tile_at_signed(x as i32 + dx, y as i32 + dy) == Some(TileKind::Floor)
            });
            if touches_floor {
                walls.push((x, y));
            }
        }
        for (x, y) in walls {
            self.grid.set_tile(x, y, TileKind::Wall);
        }
    }

    /// Tile at a signed position; off-map reads as `Void`.
    pub fn tile(&self, x: i32, y: i32) -> TileKind {
        self.grid.tile_at_signed(x, y).unwrap_or(TileKind::Void)
    }

    pub fn grid(&self) -> &MapGrid {
        &self.grid
    }

    pub fn into_grid(self) -> MapGrid {
        self.grid
    }
}

pub struct DrunkWalkGenerator;

impl MapGenerator<DrunkWalkParams> for DrunkWalkGenerator {
    fn id(&self) -> &'static str {
        "drunkwalk"
    }

    fn version(&self) -> u32 {
        1
    }

    fn generate(&self, req: &GenerateRequest<DrunkWalkParams>) -> Result<GeneratedMap, GenError> {
        let size = checked_size(req.width, req.height)?;
        let mut walk = DrunkWalk::new(req.seed, size);
        walk.generate_floor(&req.params)?;
        walk.generate_walls();

        let anchors = vec![SpawnAnchor {
            kind: AnchorKind::PlayerStart,
            x: req.width / 2,
            y: req.height / 2,
            tag: None,
        }];

        Ok(GeneratedMap::with_computed_fingerprint(
            self.id(),
            self.version(),
            req.seed,
            walk.into_grid(),
            anchors,
        ))
    }
}
