pub use crate::aseprite::{
    AnimatedSprite, Animation, AnimationEvent, AnimationFrame, AsepriteError, Direction, Region,
    SheetOptions, SpriteSheet,
};
pub use crate::core::{viewport_centered, CoreError, MapGrid, MapRead, MapSize, TileKind};
pub use crate::mapgen::{
    ChargeField, ChargeGenerator, ChargeParams, DrunkWalk, DrunkWalkGenerator, DrunkWalkParams,
    Voronoi, VoronoiGenerator, VoronoiParams,
};
pub use crate::parse::{parse_index_grid, IndexParseOptions, ParseError};
pub use crate::procgen::{
    compute_fingerprint, AnchorKind, GenError, GenerateRequest, GeneratedMap, GenerationFingerprint,
    MapGenerator, SeededRng, SpawnAnchor,
};
pub use crate::tilemap::{TileOrder, TilePlacement, Tilemap, TilemapError, Tileset};
pub use crate::viewport::{Viewport, ViewportError, WorldRect};

#[cfg(feature = "ratatui")]
pub use crate::render::{
    adjust_color, cell_seed, cell_to_screen, paint_sprite, paint_tilemap, tile_seed, Camera,
    MapRenderResult, MapRenderer, MapRendererBuilder, RenderConfig, TextureVariant, TilePaint,
    TilePalette, TileTheme, TileThemeBuilder, ViewportRenderResult,
};
