use std::path::Path;

use image::{imageops, RgbaImage};
use thiserror::Error;

use crate::core::{MapRead, MapSize, TileKind};
use crate::parse::{parse_index_grid, IndexParseOptions, ParseError};

#[derive(Debug, Error)]
pub enum TilemapError {
    #[error("tile size {tile_width}x{tile_height} does not fit image {image_width}x{image_height}")]
    InvalidTileSize {
        tile_width: u32,
        tile_height: u32,
        image_width: u32,
        image_height: u32,
    },
    #[error("failed to load tileset image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to read map data: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Which image row gets the first tile indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TileOrder {
    /// Row-major from the top-left tile; leftover pixels sit on the bottom edge.
    #[default]
    TopDown,
    /// Row-major from the bottom-left tile, as in y-up image grids; the grid
    /// is aligned to the bottom edge and leftover pixels sit on top.
    BottomUp,
}

/// An image cut into equally sized tiles.
///
/// Tiles are numbered row-major in the chosen [`TileOrder`]. Leftover
/// pixels on the right edge are always ignored.
#[derive(Clone, Debug)]
pub struct Tileset {
    tile_width: u32,
    tile_height: u32,
    columns: u32,
    rows: u32,
    order: TileOrder,
    tiles: Vec<RgbaImage>,
}

impl Tileset {
    pub fn from_image(image: &RgbaImage, tile_width: u32, tile_height: u32) -> Result<Self, TilemapError> {
        Self::from_image_ordered(image, tile_width, tile_height, TileOrder::TopDown)
    }

    pub fn from_image_ordered(
        image: &RgbaImage,
        tile_width: u32,
        tile_height: u32,
        order: TileOrder,
    ) -> Result<Self, TilemapError> {
        let (image_width, image_height) = image.dimensions();
        if tile_width == 0 || tile_height == 0 || tile_width > image_width || tile_height > image_height {
            return Err(TilemapError::InvalidTileSize {
                tile_width,
                tile_height,
                image_width,
                image_height,
            });
        }

        let columns = image_width / tile_width;
        let rows = image_height / tile_height;
        let mut tiles = Vec::with_capacity((columns * rows) as usize);
        for row in 0..rows {
            let top = match order {
                TileOrder::TopDown => row * tile_height,
                TileOrder::BottomUp => image_height - (row + 1) * tile_height,
            };
            for col in 0..columns {
                let tile = imageops::crop_imm(image, col * tile_width, top, tile_width, tile_height);
                tiles.push(tile.to_image());
            }
        }

        log::debug!("tileset {columns}x{rows} tiles of {tile_width}x{tile_height}, {order:?}");
        Ok(Self {
            tile_width,
            tile_height,
            columns,
            rows,
            order,
            tiles,
        })
    }

    pub fn open(path: impl AsRef<Path>, tile_width: u32, tile_height: u32) -> Result<Self, TilemapError> {
        Self::open_ordered(path, tile_width, tile_height, TileOrder::TopDown)
    }

    pub fn open_ordered(
        path: impl AsRef<Path>,
        tile_width: u32,
        tile_height: u32,
        order: TileOrder,
    ) -> Result<Self, TilemapError> {
        let image = image::open(path)?.to_rgba8();
        Self::from_image_ordered(&image, tile_width, tile_height, order)
    }

    pub fn from_memory(bytes: &[u8], tile_width: u32, tile_height: u32) -> Result<Self, TilemapError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_image(&image, tile_width, tile_height)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn grid_size(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    pub fn order(&self) -> TileOrder {
        self.order
    }

    pub fn tile(&self, index: usize) -> Option<&RgbaImage> {
        self.tiles.get(index)
    }

    /// RGBA pixel of a tile, `None` for unknown tiles or pixels outside it.
    pub fn pixel(&self, index: usize, px: u32, py: u32) -> Option<[u8; 4]> {
        let tile = self.tiles.get(index)?;
        if px >= self.tile_width || py >= self.tile_height {
            return None;
        }
        Some(tile.get_pixel(px, py).0)
    }
}

/// One drawable tile of a [`Tilemap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePlacement {
    pub tile: usize,
    pub x: u32,
    pub y: u32,
    pub world_x: u32,
    pub world_y: u32,
}

/// Grid of tileset indices.
///
/// Map rows may have different lengths. An index that is negative or not
/// below `tileset.len()` leaves its cell empty.
#[derive(Clone, Debug)]
pub struct Tilemap {
    tileset: Tileset,
    map_data: Vec<Vec<i32>>,
}

impl Tilemap {
    pub fn new(tileset: Tileset, map_data: Vec<Vec<i32>>) -> Self {
        Self { tileset, map_data }
    }

    /// Loads index rows from a text file (see [`parse_index_grid`]).
    pub fn with_data_file(
        tileset: Tileset,
        path: impl AsRef<Path>,
        options: &IndexParseOptions,
    ) -> Result<Self, TilemapError> {
        let text = std::fs::read_to_string(path)?;
        let map_data = parse_index_grid(&text, options)?;
        Ok(Self::new(tileset, map_data))
    }

    pub fn set_map_data(&mut self, map_data: Vec<Vec<i32>>) {
        self.map_data = map_data;
    }

    pub fn map_data(&self) -> &[Vec<i32>] {
        &self.map_data
    }

    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }

    pub fn tile_size(&self) -> (u32, u32) {
        self.tileset.tile_size()
    }

    /// Tile coordinates containing a world position; floors toward negative infinity.
    pub fn world_pos_to_tile_pos(&self, x: f32, y: f32) -> (i32, i32) {
        let (tw, th) = self.tileset.tile_size();
        ((x / tw as f32).floor() as i32, (y / th as f32).floor() as i32)
    }

    pub fn tile_index_at(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let raw = *self.map_data.get(y as usize)?.get(x as usize)?;
        self.valid_index(raw)
    }

    fn valid_index(&self, raw: i32) -> Option<usize> {
        if raw < 0 || raw as usize >= self.tileset.len() {
            return None;
        }
        Some(raw as usize)
    }

    /// Every drawable tile with its world position, row by row.
    pub fn placements(&self) -> impl Iterator<Item = TilePlacement> + '_ {
        let (tw, th) = self.tileset.tile_size();
        self.map_data.iter().enumerate().flat_map(move |(y, row)| {
            row.iter().enumerate().filter_map(move |(x, raw)| {
                let tile = self.valid_index(*raw)?;
                Some(TilePlacement {
                    tile,
                    x: x as u32,
                    y: y as u32,
                    world_x: x as u32 * tw,
                    world_y: y as u32 * th,
                })
            })
        })
    }

    /// Pixel colour at a world position, `None` over empty cells.
    pub fn pixel_at_world(&self, x: f32, y: f32) -> Option<[u8; 4]> {
        let (tile_x, tile_y) = self.world_pos_to_tile_pos(x, y);
        let tile = self.tile_index_at(tile_x, tile_y)?;
        let (tw, th) = self.tileset.tile_size();
        let px = (x - (tile_x * tw as i32) as f32).floor() as u32;
        let py = (y - (tile_y * th as i32) as f32).floor() as u32;
        self.tileset.pixel(tile, px.min(tw - 1), py.min(th - 1))
    }

    /// Extent in tiles: row count by widest row.
    pub fn dimensions(&self) -> MapSize {
        let width = self.map_data.iter().map(Vec::len).max().unwrap_or(0);
        MapSize::new(
            width.min(u16::MAX as usize) as u16,
            self.map_data.len().min(u16::MAX as usize) as u16,
        )
    }
}

impl MapRead for Tilemap {
    fn map_size(&self) -> MapSize {
        self.dimensions()
    }

    fn tile_kind(&self, x: u16, y: u16) -> TileKind {
        match self.tile_index_at(x as i32, y as i32) {
            Some(index) => TileKind::Custom(index.min(u16::MAX as usize) as u16),
            None => TileKind::Void,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    /// 4x2 tiles of 2x2 pixels; tile `i` is filled with red = i.
    fn sample_tileset() -> Tileset {
        let image = RgbaImage::from_fn(8, 4, |x, y| {
            let index = (y / 2) * 4 + x / 2;
            Rgba([index as u8, 0, 0, 255])
        });
        Tileset::from_image(&image, 2, 2).expect("tileset")
    }

    #[test]
    fn tileset_cuts_row_major_from_top_left() {
        let tileset = sample_tileset();
        assert_eq!(tileset.len(), 8);
        assert_eq!(tileset.grid_size(), (4, 2));
        assert_eq!(tileset.pixel(0, 1, 1), Some([0, 0, 0, 255]));
        assert_eq!(tileset.pixel(5, 0, 0), Some([5, 0, 0, 255]));
        assert_eq!(tileset.pixel(5, 2, 0), None);
        assert_eq!(tileset.pixel(8, 0, 0), None);
    }

    #[test]
    fn bottom_up_order_starts_on_the_last_row() {
        let image = RgbaImage::from_fn(8, 4, |x, y| Rgba([((y / 2) * 4 + x / 2) as u8, 0, 0, 255]));
        let tileset = Tileset::from_image_ordered(&image, 2, 2, TileOrder::BottomUp).expect("tileset");
        assert_eq!(tileset.order(), TileOrder::BottomUp);
        assert_eq!(tileset.len(), 8);
        assert_eq!(tileset.pixel(0, 0, 0), Some([4, 0, 0, 255]));
        assert_eq!(tileset.pixel(3, 1, 1), Some([7, 0, 0, 255]));
        assert_eq!(tileset.pixel(5, 0, 0), Some([1, 0, 0, 255]));

        let map = Tilemap::new(tileset, vec![vec![4, 0]]);
        assert_eq!(map.pixel_at_world(0.5, 0.5), Some([0, 0, 0, 255]));
        assert_eq!(map.pixel_at_world(2.5, 0.5), Some([4, 0, 0, 255]));
    }

    #[test]
    fn bottom_up_grid_is_aligned_to_the_bottom_edge() {
        let image = RgbaImage::from_fn(7, 5, |_, y| Rgba([y as u8, 0, 0, 255]));
        let top_down = Tileset::from_image(&image, 2, 2).expect("top down");
        let bottom_up = Tileset::from_image_ordered(&image, 2, 2, TileOrder::BottomUp).expect("bottom up");
        assert_eq!(top_down.order(), TileOrder::TopDown);
        assert_eq!(top_down.pixel(0, 0, 0), Some([0, 0, 0, 255]));
        assert_eq!(bottom_up.grid_size(), (3, 2));
        assert_eq!(bottom_up.pixel(0, 0, 0), Some([3, 0, 0, 255]));
        assert_eq!(bottom_up.pixel(3, 0, 1), Some([2, 0, 0, 255]));
    }

    #[test]
    fn tileset_ignores_partial_tiles() {
        let image = RgbaImage::new(7, 5);
        let tileset = Tileset::from_image(&image, 2, 2).expect("tileset");
        assert_eq!(tileset.grid_size(), (3, 2));
    }

    #[test]
    fn tileset_rejects_oversized_tiles() {
        let image = RgbaImage::new(4, 4);
        let err = Tileset::from_image(&image, 5, 2).expect_err("should fail");
        assert!(matches!(err, TilemapError::InvalidTileSize { tile_width: 5, .. }));
        assert!(Tileset::from_image(&image, 0, 2).is_err());
    }

    #[test]
    fn placements_skip_invalid_indices() {
        let map = Tilemap::new(sample_tileset(), vec![vec![0, -1, 7], vec![8, 3]]);
        let placed: Vec<_> = map.placements().collect();
        assert_eq!(
            placed,
            vec![
                TilePlacement {
                    tile: 0,
                    x: 0,
                    y: 0,
                    world_x: 0,
                    world_y: 0
                },
                TilePlacement {
                    tile: 7,
                    x: 2,
                    y: 0,
                    world_x: 4,
                    world_y: 0
                },
                TilePlacement {
                    tile: 3,
                    x: 1,
                    y: 1,
                    world_x: 2,
                    world_y: 2
                },
            ]
        );
    }

    #[test]
    fn world_to_tile_floors_negative_positions() {
        let map = Tilemap::new(sample_tileset(), vec![vec![0]]);
        assert_eq!(map.world_pos_to_tile_pos(3.9, 0.0), (1, 0));
        assert_eq!(map.world_pos_to_tile_pos(-0.5, -2.0), (-1, -1));
    }

    #[test]
    fn map_read_reports_void_for_empty_cells() {
        let map = Tilemap::new(sample_tileset(), vec![vec![2, -1], vec![1]]);
        assert_eq!(map.map_size(), MapSize::new(2, 2));
        assert_eq!(map.tile_kind(0, 0), TileKind::Custom(2));
        assert_eq!(map.tile_kind(1, 0), TileKind::Void);
        assert_eq!(map.tile_kind(1, 1), TileKind::Void);
    }

    #[test]
    fn pixel_lookup_goes_through_tile_index() {
        let mut map = Tilemap::new(sample_tileset(), vec![vec![6, 1]]);
        assert_eq!(map.pixel_at_world(0.5, 0.5), Some([6, 0, 0, 255]));
        assert_eq!(map.pixel_at_world(3.0, 1.0), Some([1, 0, 0, 255]));
        assert_eq!(map.pixel_at_world(4.0, 0.0), None);

        map.set_map_data(vec![vec![-1]]);
        assert_eq!(map.pixel_at_world(0.5, 0.5), None);
    }
}
