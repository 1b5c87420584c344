use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What occupies a single map cell.
///
/// `Void` is "nothing here": generators start from it and renderers leave
/// it blank. `Custom` carries a host-defined id such as a tileset index or
/// a Voronoi area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Void,
    Grass,
    Trail,
    Sand,
    Floor,
    Wall,
    Water,
    Custom(u16),
}

impl TileKind {
    pub fn is_void(self) -> bool {
        self == TileKind::Void
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapSize {
    pub width: u16,
    pub height: u16,
}

impl MapSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn tile_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapGrid {
    pub name: String,
    pub size: MapSize,
    pub tiles: Vec<TileKind>,
}

impl MapGrid {
    pub fn new(name: impl Into<String>, size: MapSize, tiles: Vec<TileKind>) -> Result<Self, CoreError> {
        let expected = size.tile_count();
        let actual = tiles.len();
        if expected != actual {
            return Err(CoreError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            name: name.into(),
            size,
            tiles,
        })
    }

    pub fn filled(name: impl Into<String>, size: MapSize, tile: TileKind) -> Self {
        Self {
            name: name.into(),
            size,
            tiles: vec![tile; size.tile_count()],
        }
    }

    pub fn width(&self) -> u16 {
        self.size.width
    }

    pub fn height(&self) -> u16 {
        self.size.height
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u16, y: u16) -> Option<TileKind> {
        let idx = self.index(x, y)?;
        self.tiles.get(idx).copied()
    }

    /// Signed lookup for neighbourhood scans; anything off the grid is `None`.
    pub fn tile_at_signed(&self, x: i32, y: i32) -> Option<TileKind> {
        if !self.size.contains(x, y) {
            return None;
        }
        self.tile_at(x as u16, y as u16)
    }

    pub fn tile_kind(&self, x: u16, y: u16) -> TileKind {
        self.tile_at(x, y).unwrap_or(TileKind::Wall)
    }

    /// Returns `false` when the position is off the grid.
    pub fn set_tile(&mut self, x: u16, y: u16, tile: TileKind) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.tiles[idx] = tile;
                true
            }
            None => false,
        }
    }

    pub fn count(&self, tile: TileKind) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }

    /// Iterates `(x, y, tile)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16, TileKind)> + '_ {
        let width = self.size.width.max(1) as usize;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(idx, tile)| ((idx % width) as u16, (idx / width) as u16, *tile))
    }
}

pub trait MapRead {
    fn map_size(&self) -> MapSize;
    fn tile_kind(&self, x: u16, y: u16) -> TileKind;
}

impl MapRead for MapGrid {
    fn map_size(&self) -> MapSize {
        self.size
    }

    fn tile_kind(&self, x: u16, y: u16) -> TileKind {
        self.tile_kind(x, y)
    }
}

pub fn viewport_centered(
    focus_x: u16,
    focus_y: u16,
    map: MapSize,
    view_cols: u16,
    view_rows: u16,
) -> (u16, u16) {
    if map.width == 0 || map.height == 0 || view_cols == 0 || view_rows == 0 {
        return (0, 0);
    }

    let half_cols = view_cols / 2;
    let half_rows = view_rows / 2;
    let max_x = map.width.saturating_sub(view_cols);
    let max_y = map.height.saturating_sub(view_rows);
    let start_x = focus_x.saturating_sub(half_cols).min(max_x);
    let start_y = focus_y.saturating_sub(half_rows).min(max_y);
    (start_x, start_y)
}
