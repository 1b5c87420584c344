use ratatui::layout::Rect;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_gamekit::aseprite::AnimatedSprite;
use tui_gamekit::core::{MapGrid, MapRead, MapSize, TileKind};
use tui_gamekit::tilemap::Tilemap;
use tui_gamekit::viewport::Viewport;

/// World units per generated map tile. Sprites and tilesets use one unit per pixel.
pub const MAP_TILE_WORLD: f32 = 8.0;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
pub enum GeneratorKind {
    #[value(name = "drunkwalk")]
    DrunkWalk,
    Voronoi,
    Charge,
}

impl GeneratorKind {
    pub fn next(self) -> Self {
        match self {
            GeneratorKind::DrunkWalk => GeneratorKind::Voronoi,
            GeneratorKind::Voronoi => GeneratorKind::Charge,
            GeneratorKind::Charge => GeneratorKind::DrunkWalk,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GeneratorKind::DrunkWalk => "drunkwalk",
            GeneratorKind::Voronoi => "voronoi",
            GeneratorKind::Charge => "charge",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Tile {
    Void,
    Grass,
    Trail,
    Sand,
    Floor,
    Wall,
    Water,
    Area(u16),
}

impl Tile {
    pub fn to_tile_kind(self) -> TileKind {
        match self {
            Tile::Void => TileKind::Void,
            Tile::Grass => TileKind::Grass,
            Tile::Trail => TileKind::Trail,
            Tile::Sand => TileKind::Sand,
            Tile::Floor => TileKind::Floor,
            Tile::Wall => TileKind::Wall,
            Tile::Water => TileKind::Water,
            Tile::Area(id) => TileKind::Custom(id),
        }
    }

    pub fn from_tile_kind(kind: TileKind) -> Self {
        match kind {
            TileKind::Void => Tile::Void,
            TileKind::Grass => Tile::Grass,
            TileKind::Trail => Tile::Trail,
            TileKind::Sand => Tile::Sand,
            TileKind::Floor => Tile::Floor,
            TileKind::Wall => Tile::Wall,
            TileKind::Water => Tile::Water,
            TileKind::Custom(id) => Tile::Area(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MapState {
    pub name: String,
    pub width: u16,
    pub height: u16,
    pub tiles: Vec<Tile>,
}

impl MapState {
    pub fn from_grid(grid: MapGrid) -> Self {
        Self {
            name: grid.name,
            width: grid.size.width,
            height: grid.size.height,
            tiles: grid.tiles.into_iter().map(Tile::from_tile_kind).collect(),
        }
    }

    pub fn tile(&self, x: u16, y: u16) -> Tile {
        if x >= self.width || y >= self.height {
            return Tile::Void;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.tiles.get(idx).copied().unwrap_or(Tile::Void)
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }

    /// Centre of the map in world units.
    pub fn world_center(&self) -> (f32, f32) {
        (
            self.width as f32 * MAP_TILE_WORLD / 2.0,
            self.height as f32 * MAP_TILE_WORLD / 2.0,
        )
    }
}

impl MapRead for MapState {
    fn map_size(&self) -> MapSize {
        MapSize::new(self.width, self.height)
    }

    fn tile_kind(&self, x: u16, y: u16) -> TileKind {
        self.tile(x, y).to_tile_kind()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MapMarker {
    pub x: u16,
    pub y: u16,
    pub start: bool,
    pub tag: Option<String>,
}

impl MapMarker {
    /// Centre of the marked tile in world units.
    pub fn world_pos(&self) -> (f32, f32) {
        (
            (self.x as f32 + 0.5) * MAP_TILE_WORLD,
            (self.y as f32 + 0.5) * MAP_TILE_WORLD,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedLevel {
    pub map: MapState,
    pub markers: Vec<MapMarker>,
    pub generator: GeneratorKind,
    pub seed: u64,
    pub fingerprint: String,
}

impl GeneratedLevel {
    pub fn start(&self) -> Option<&MapMarker> {
        self.markers.iter().find(|marker| marker.start)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Layer {
    Generated,
    Tileset,
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub seed: u64,
    pub generator: GeneratorKind,
    pub map_width: u16,
    pub map_height: u16,
    pub generating: bool,
    pub level: Option<GeneratedLevel>,
    pub viewport: Viewport,
    /// Terminal cells the map is drawn into.
    pub view_area: Rect,
    pub drag_from: Option<(u16, u16)>,
    pub layer: Layer,
    pub sprite: Option<AnimatedSprite>,
    pub tilemap: Option<Tilemap>,
    pub last_status: Option<String>,
}

impl AppState {
    pub fn new(seed: u64, generator: GeneratorKind, map_width: u16, map_height: u16) -> Self {
        let view_area = Rect::new(0, 0, 80, 24);
        Self {
            seed,
            generator,
            map_width,
            map_height,
            generating: false,
            level: None,
            viewport: initial_viewport(view_area),
            view_area,
            drag_from: None,
            layer: Layer::Generated,
            sprite: None,
            tilemap: None,
            last_status: None,
        }
    }

    pub fn map(&self) -> Option<&MapState> {
        self.level.as_ref().map(|level| &level.map)
    }

    pub fn apply_level(&mut self, level: GeneratedLevel) {
        let (cx, cy) = level.map.world_center();
        self.viewport.focus(cx, cy);

        if let Some(sprite) = self.sprite.as_mut() {
            let (x, y) = level.start().map(MapMarker::world_pos).unwrap_or((cx, cy));
            sprite.set_anchor_position(x, y);
        }

        self.generating = false;
        self.last_status = Some(format!(
            "{} map {}x{} ready ({})",
            level.generator.label(),
            level.map.width,
            level.map.height,
            short_fingerprint(&level.fingerprint)
        ));
        self.level = Some(level);
    }
}

/// Viewport whose screen space has two units per terminal row, matching
/// half-block pixels.
pub fn viewport_screen_size(area: Rect) -> (f32, f32) {
    (area.width.max(1) as f32, area.height.max(1) as f32 * 2.0)
}

fn initial_viewport(area: Rect) -> Viewport {
    let (w, h) = viewport_screen_size(area);
    Viewport::new(w, h).unwrap_or_default()
}

fn short_fingerprint(hex: &str) -> &str {
    hex.get(..8).unwrap_or(hex)
}

/// Roughly square grid showing every tile of a tileset once.
pub fn tileset_preview(count: usize) -> Vec<Vec<i32>> {
    if count == 0 {
        return Vec::new();
    }
    let columns = (count as f64).sqrt().ceil() as usize;
    (0..count)
        .collect::<Vec<_>>()
        .chunks(columns)
        .map(|row| row.iter().map(|index| *index as i32).collect())
        .collect()
}
