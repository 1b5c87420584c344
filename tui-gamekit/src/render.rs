use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use ratatui::{buffer::Cell, layout::Rect, style::Color, Frame};

use crate::aseprite::AnimatedSprite;
use crate::core::{viewport_centered, MapRead, TileKind};
use crate::tilemap::Tilemap;
use crate::viewport::Viewport;

/// Upper half block; foreground paints the top pixel, background the bottom one.
pub const HALF_BLOCK: &str = "▀";

/// Pixels with lower alpha are treated as transparent.
pub const ALPHA_THRESHOLD: u8 = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureVariant {
    pub ch: char,
    pub fg: Color,
    pub density: u8,
}

impl TextureVariant {
    pub const fn new(ch: char, fg: Color, density: u8) -> Self {
        Self { ch, fg, density }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePalette {
    pub main: Color,
    pub alt: Color,
    pub variants: [TextureVariant; 3],
}

impl TilePalette {
    pub const fn new(main: Color, alt: Color, variants: [TextureVariant; 3]) -> Self {
        Self {
            main,
            alt,
            variants,
        }
    }

    /// Two-tone palette whose texture characters are shades of `main`.
    pub fn shaded(main: Color, chars: [char; 3], density: u8) -> Self {
        Self::new(
            main,
            adjust_color(main, 4),
            [
                TextureVariant::new(chars[0], adjust_color(main, 18), density),
                TextureVariant::new(chars[1], adjust_color(main, 10), density.saturating_add(1)),
                TextureVariant::new(chars[2], adjust_color(main, -8), density.saturating_add(2)),
            ],
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePaint {
    /// `main` or `alt` of the palette, picked per tile.
    pub background: Color,
    pub texture: TextureVariant,
}

type VariantSelector =
    Arc<dyn Fn(TileKind, u16, u16, u32, &TilePalette) -> TextureVariant + Send + Sync>;

/// Maps tile kinds to palettes. `Void` always paints nothing; `Custom` ids
/// without a palette get a stable colour derived from the id.
#[derive(Clone)]
pub struct TileTheme {
    palettes: HashMap<TileKind, TilePalette>,
    fallback: TilePalette,
    variant_selector: VariantSelector,
}

impl TileTheme {
    pub fn builder() -> TileThemeBuilder {
        TileThemeBuilder::default()
    }

    /// Palettes for every built-in tile kind.
    pub fn standard() -> Self {
        Self::builder()
            .tile(TileKind::Grass, TilePalette::shaded(Color::Rgb(34, 112, 58), ['.', '\'', '`'], 6))
            .tile(TileKind::Trail, TilePalette::shaded(Color::Rgb(120, 92, 60), ['.', ',', ' '], 7))
            .tile(TileKind::Sand, TilePalette::shaded(Color::Rgb(194, 170, 110), ['.', ':', '`'], 8))
            .tile(TileKind::Floor, TilePalette::shaded(Color::Rgb(88, 84, 78), ['.', '·', ' '], 9))
            .tile(TileKind::Wall, TilePalette::shaded(Color::Rgb(52, 48, 56), ['#', '=', '%'], 3))
            .tile(TileKind::Water, TilePalette::shaded(Color::Rgb(32, 78, 140), ['~', '≈', '-'], 5))
            .build()
    }

    pub fn palette(&self, tile: TileKind) -> Option<TilePalette> {
        if tile.is_void() {
            return None;
        }
        if let Some(palette) = self.palettes.get(&tile) {
            return Some(*palette);
        }
        match tile {
            TileKind::Custom(id) => Some(custom_palette(id)),
            _ => Some(self.fallback),
        }
    }

    /// `None` for `Void` tiles.
    pub fn paint(&self, tile: TileKind, map_x: u16, map_y: u16) -> Option<TilePaint> {
        let palette = self.palette(tile)?;
        let seed = tile_seed(map_x, map_y);
        let texture = (self.variant_selector)(tile, map_x, map_y, seed, &palette);
        let background = if seed % 2 == 0 { palette.main } else { palette.alt };
        Some(TilePaint { background, texture })
    }
}

fn custom_palette(id: u16) -> TilePalette {
    let seed = tile_seed(id, 0x5eed);
    let channel = |shift: u32| 60 + ((seed >> shift) % 140) as u8;
    TilePalette::shaded(Color::Rgb(channel(0), channel(8), channel(16)), ['.', ' ', ' '], 12)
}

#[derive(Clone)]
pub struct TileThemeBuilder {
    palettes: HashMap<TileKind, TilePalette>,
    fallback: TilePalette,
    variant_selector: Option<VariantSelector>,
}

impl Default for TileThemeBuilder {
    fn default() -> Self {
        Self {
            palettes: HashMap::new(),
            fallback: TilePalette::shaded(Color::Rgb(70, 70, 70), ['?', '.', ' '], 6),
            variant_selector: None,
        }
    }
}

impl TileThemeBuilder {
    pub fn tile(mut self, kind: TileKind, palette: TilePalette) -> Self {
        self.palettes.insert(kind, palette);
        self
    }

    pub fn fallback(mut self, palette: TilePalette) -> Self {
        self.fallback = palette;
        self
    }

    pub fn variant_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(TileKind, u16, u16, u32, &TilePalette) -> TextureVariant + Send + Sync + 'static,
    {
        self.variant_selector = Some(Arc::new(selector));
        self
    }

    pub fn build(self) -> TileTheme {
        let selector: VariantSelector = self.variant_selector.unwrap_or_else(|| {
            Arc::new(|_tile, _x, _y, seed, palette| {
                let idx = (seed % palette.variants.len() as u32) as usize;
                palette.variants[idx]
            })
        });

        TileTheme {
            palettes: self.palettes,
            fallback: self.fallback,
            variant_selector: selector,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    /// Tiles `render_base` tries to fit vertically.
    pub map_tiles_vertical_hint: u16,
    /// Terminal cell height over width.
    pub cell_aspect: f32,
    /// World units per tile for `render_viewport`.
    pub world_tile_size: (f32, f32),
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            map_tiles_vertical_hint: 9,
            cell_aspect: 2.0,
            world_tile_size: (1.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Camera {
    pub focus_x: u16,
    pub focus_y: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapRenderResult {
    pub start_x: u16,
    pub start_y: u16,
    pub view_tiles_h: u16,
    pub view_tiles_v: u16,
    pub origin_x: u16,
    pub origin_y: u16,
    pub cols_per_tile: u16,
    pub rows_per_tile: u16,
}

impl MapRenderResult {
    pub fn marker_cell(&self, map_x: u16, map_y: u16) -> Option<(u16, u16)> {
        let (cell_x, cell_y) = self.tile_cell_origin(map_x, map_y)?;
        Some((
            cell_x + self.cols_per_tile / 2,
            cell_y + self.rows_per_tile / 2,
        ))
    }

    pub fn tile_cell_origin(&self, map_x: u16, map_y: u16) -> Option<(u16, u16)> {
        if self.view_tiles_h == 0 || self.view_tiles_v == 0 {
            return None;
        }
        if map_x < self.start_x
            || map_y < self.start_y
            || map_x >= self.start_x + self.view_tiles_h
            || map_y >= self.start_y + self.view_tiles_v
        {
            return None;
        }

        let tile_col = map_x - self.start_x;
        let tile_row = map_y - self.start_y;
        Some((
            self.origin_x + tile_col * self.cols_per_tile,
            self.origin_y + tile_row * self.rows_per_tile,
        ))
    }
}

/// Outcome of [`MapRenderer::render_viewport`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewportRenderResult {
    pub columns: Range<i32>,
    pub rows: Range<i32>,
    /// Cells that landed on a non-void tile.
    pub painted_cells: u32,
}

#[derive(Clone)]
pub struct MapRendererBuilder {
    config: RenderConfig,
    theme: TileTheme,
}

impl Default for MapRendererBuilder {
    fn default() -> Self {
        Self {
            config: RenderConfig::default(),
            theme: TileTheme::standard(),
        }
    }
}

impl MapRendererBuilder {
    pub fn config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn map_tiles_vertical_hint(mut self, value: u16) -> Self {
        self.config.map_tiles_vertical_hint = value;
        self
    }

    pub fn cell_aspect(mut self, value: f32) -> Self {
        self.config.cell_aspect = value;
        self
    }

    pub fn world_tile_size(mut self, width: f32, height: f32) -> Self {
        self.config.world_tile_size = (width, height);
        self
    }

    pub fn theme(mut self, theme: TileTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn build(self) -> MapRenderer {
        MapRenderer {
            config: self.config,
            theme: self.theme,
        }
    }
}

#[derive(Clone)]
pub struct MapRenderer {
    config: RenderConfig,
    theme: TileTheme,
}

impl MapRenderer {
    pub fn builder() -> MapRendererBuilder {
        MapRendererBuilder::default()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Fixed-scale rendering: whole tiles of `cols_per_tile x rows_per_tile`
    /// cells, centred on the camera tile and clamped to the map.
    pub fn render_base<M: MapRead>(
        &self,
        frame: &mut Frame,
        area: Rect,
        map: &M,
        camera: Camera,
    ) -> MapRenderResult {
        let mut result = MapRenderResult::default();
        let map_size = map.map_size();

        if area.width == 0 || area.height == 0 || map_size.is_empty() {
            return result;
        }

        let hint = self.config.map_tiles_vertical_hint.max(1);
        let rows_per_tile = (area.height / hint).max(2);
        let cols_per_tile = ((rows_per_tile as f32 * self.config.cell_aspect).round() as u16).max(2);

        let view_tiles_h = (area.width / cols_per_tile).min(map_size.width);
        let view_tiles_v = (area.height / rows_per_tile).min(map_size.height);

        result.cols_per_tile = cols_per_tile;
        result.rows_per_tile = rows_per_tile;
        result.view_tiles_h = view_tiles_h;
        result.view_tiles_v = view_tiles_v;

        if view_tiles_h == 0 || view_tiles_v == 0 {
            return result;
        }

        let pad_x = area.width.saturating_sub(view_tiles_h * cols_per_tile) / 2;
        let pad_y = area.height.saturating_sub(view_tiles_v * rows_per_tile) / 2;
        result.origin_x = area.x + pad_x;
        result.origin_y = area.y + pad_y;

        let (start_x, start_y) = viewport_centered(
            camera.focus_x,
            camera.focus_y,
            map_size,
            view_tiles_h,
            view_tiles_v,
        );
        result.start_x = start_x;
        result.start_y = start_y;

        let buf = frame.buffer_mut();
        for tile_row in 0..view_tiles_v {
            for tile_col in 0..view_tiles_h {
                let map_x = start_x + tile_col;
                let map_y = start_y + tile_row;
                let paint = self.theme.paint(map.tile_kind(map_x, map_y), map_x, map_y);

                let cell_x = result.origin_x + tile_col * cols_per_tile;
                let cell_y = result.origin_y + tile_row * rows_per_tile;
                for dy in 0..rows_per_tile {
                    for dx in 0..cols_per_tile {
                        if let Some(cell) = buf.cell_mut((cell_x + dx, cell_y + dy)) {
                            paint_cell(cell, paint.as_ref(), cell_seed(map_x, map_y, dx, dy));
                        }
                    }
                }
            }
        }

        result
    }

    /// Free pan/zoom rendering: every cell of `area` samples the map at the
    /// world point under its centre. The viewport's screen space is stretched
    /// over `area`, so its screen size only sets the aspect and the scale.
    pub fn render_viewport<M: MapRead>(
        &self,
        frame: &mut Frame,
        area: Rect,
        map: &M,
        viewport: &Viewport,
    ) -> ViewportRenderResult {
        let (tile_w, tile_h) = self.config.world_tile_size;
        let (columns, rows) = viewport.visible_tiles(tile_w, tile_h);
        let mut result = ViewportRenderResult {
            columns,
            rows,
            painted_cells: 0,
        };
        if area.width == 0 || area.height == 0 || tile_w <= 0.0 || tile_h <= 0.0 {
            return result;
        }

        let map_size = map.map_size();
        let (screen_w, screen_h) = viewport.screen_size();
        let buf = frame.buffer_mut();
        for row in 0..area.height {
            for col in 0..area.width {
                let sx = (col as f32 + 0.5) * screen_w / area.width as f32;
                let sy = (row as f32 + 0.5) * screen_h / area.height as f32;
                let (wx, wy) = viewport.screen_to_world(sx, sy);
                let (tx, ty) = ((wx / tile_w).floor(), (wy / tile_h).floor());

                let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) else {
                    continue;
                };
                if !map_size.contains(tx as i32, ty as i32) {
                    paint_cell(cell, None, 0);
                    continue;
                }

                let (map_x, map_y) = (tx as u16, ty as u16);
                let paint = self.theme.paint(map.tile_kind(map_x, map_y), map_x, map_y);
                // texture sticks to the world, not to the screen
                let sub_x = ((wx / tile_w - tx) * 8.0) as u16;
                let sub_y = ((wy / tile_h - ty) * 8.0) as u16;
                if paint.is_some() {
                    result.painted_cells += 1;
                }
                paint_cell(cell, paint.as_ref(), cell_seed(map_x, map_y, sub_x, sub_y));
            }
        }

        result
    }
}

fn paint_cell(cell: &mut Cell, paint: Option<&TilePaint>, sprinkle: u32) {
    let Some(paint) = paint else {
        cell.reset();
        return;
    };
    let bg = paint.background;
    let density = paint.texture.density.max(1) as u32;
    if sprinkle % density == 0 {
        cell.set_bg(bg).set_fg(paint.texture.fg).set_char(paint.texture.ch);
    } else {
        cell.set_bg(bg).set_fg(bg).set_char(' ');
    }
}

/// Viewport screen coordinates of a terminal cell centre, `None` outside `area`.
pub fn cell_to_screen(area: Rect, viewport: &Viewport, column: u16, row: u16) -> Option<(f32, f32)> {
    if area.width == 0 || area.height == 0 || !area.contains((column, row).into()) {
        return None;
    }
    let (screen_w, screen_h) = viewport.screen_size();
    Some((
        ((column - area.x) as f32 + 0.5) * screen_w / area.width as f32,
        ((row - area.y) as f32 + 0.5) * screen_h / area.height as f32,
    ))
}

/// Draws tileset pixels with half blocks. The viewport's world unit is one
/// tileset pixel; its screen space is stretched over `area` at two pixel rows
/// per terminal row. Empty and transparent pixels keep what is underneath.
pub fn paint_tilemap(frame: &mut Frame, area: Rect, tilemap: &Tilemap, viewport: &Viewport) {
    paint_half_blocks(frame, area, viewport, |wx, wy| tilemap.pixel_at_world(wx, wy));
}

/// Draws the current frame of `sprite` like [`paint_tilemap`].
pub fn paint_sprite(frame: &mut Frame, area: Rect, sprite: &AnimatedSprite, viewport: &Viewport) {
    let (min_x, min_y, max_x, max_y) = sprite.aabb();
    let projection = viewport.projection();
    if max_x < projection.min_x || min_x > projection.max_x || max_y < projection.min_y || min_y > projection.max_y {
        return;
    }
    paint_half_blocks(frame, area, viewport, |wx, wy| sprite.pixel_at_world(wx, wy));
}

fn paint_half_blocks<F>(frame: &mut Frame, area: Rect, viewport: &Viewport, sample: F)
where
    F: Fn(f32, f32) -> Option<[u8; 4]>,
{
    if area.width == 0 || area.height == 0 {
        return;
    }
    let (screen_w, screen_h) = viewport.screen_size();
    let pixel_rows = area.height as f32 * 2.0;
    let colour_at = |sx: f32, sy: f32| {
        let (wx, wy) = viewport.screen_to_world(sx, sy);
        sample(wx, wy).and_then(pixel_color)
    };

    let buf = frame.buffer_mut();
    for row in 0..area.height {
        for col in 0..area.width {
            let sx = (col as f32 + 0.5) * screen_w / area.width as f32;
            let top_y = (row as f32 * 2.0 + 0.5) * screen_h / pixel_rows;
            let bottom_y = (row as f32 * 2.0 + 1.5) * screen_h / pixel_rows;
            let top = colour_at(sx, top_y);
            let bottom = colour_at(sx, bottom_y);
            if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                blend_half_block(cell, top, bottom);
            }
        }
    }
}

fn pixel_color([r, g, b, a]: [u8; 4]) -> Option<Color> {
    (a >= ALPHA_THRESHOLD).then_some(Color::Rgb(r, g, b))
}

fn blend_half_block(cell: &mut Cell, top: Option<Color>, bottom: Option<Color>) {
    if top.is_none() && bottom.is_none() {
        return;
    }
    let (old_top, old_bottom) = if cell.symbol() == HALF_BLOCK {
        (cell.fg, cell.bg)
    } else {
        (cell.bg, cell.bg)
    };
    cell.set_symbol(HALF_BLOCK)
        .set_fg(top.unwrap_or(old_top))
        .set_bg(bottom.unwrap_or(old_bottom));
}

pub fn adjust_color(color: Color, delta: i16) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let clamp = |v: i16| v.clamp(0, 255) as u8;
            Color::Rgb(
                clamp(r as i16 + delta),
                clamp(g as i16 + delta),
                clamp(b as i16 + delta),
            )
        }
        other => other,
    }
}

pub fn tile_seed(x: u16, y: u16) -> u32 {
    let mut n = x as u32;
    n = n
        .wrapping_mul(374_761_393)
        .wrapping_add((y as u32).wrapping_mul(668_265_263));
    n ^= n >> 13;
    n = n.wrapping_mul(1_274_126_177);
    n ^= n >> 16;
    n
}

pub fn cell_seed(x: u16, y: u16, dx: u16, dy: u16) -> u32 {
    let mut n = tile_seed(x, y);
    n ^= (dx as u32).wrapping_mul(2_246_822_519);
    n ^= (dy as u32).wrapping_mul(3_266_489_917);
    n ^= n >> 15;
    n = n.wrapping_mul(668_265_263);
    n ^= n >> 13;
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aseprite::tests::sample_sheet;
    use crate::core::{MapGrid, MapSize};
    use crate::tilemap::Tileset;
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use ratatui::{backend::TestBackend, Terminal};

    fn terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(width, height)).expect("terminal")
    }

    #[test]
    fn void_has_no_paint() {
        let theme = TileTheme::standard();
        assert_eq!(theme.paint(TileKind::Void, 0, 0), None);
        assert!(theme.paint(TileKind::Grass, 0, 0).is_some());
    }

    #[test]
    fn custom_ids_get_stable_distinct_colours() {
        let theme = TileTheme::standard();
        let a = theme.palette(TileKind::Custom(1)).expect("a");
        let again = theme.palette(TileKind::Custom(1)).expect("again");
        let b = theme.palette(TileKind::Custom(2)).expect("b");
        assert_eq!(a, again);
        assert_ne!(a.main, b.main);
    }

    #[test]
    fn marker_projection_is_stable() {
        let result = MapRenderResult {
            start_x: 10,
            start_y: 20,
            view_tiles_h: 8,
            view_tiles_v: 6,
            origin_x: 3,
            origin_y: 4,
            cols_per_tile: 2,
            rows_per_tile: 3,
        };

        assert_eq!(result.tile_cell_origin(10, 20), Some((3, 4)));
        assert_eq!(result.marker_cell(11, 21), Some((6, 8)));
        assert_eq!(result.marker_cell(100, 100), None);
    }

    #[test]
    fn render_base_is_deterministic() {
        let map = MapGrid::filled("demo", MapSize::new(12, 12), TileKind::Grass);
        let renderer = MapRenderer::builder().build();
        let camera = Camera {
            focus_x: 6,
            focus_y: 6,
        };

        let mut terminal = terminal(40, 20);
        let mut first = MapRenderResult::default();
        terminal
            .draw(|frame| {
                first = renderer.render_base(frame, Rect::new(0, 0, 40, 20), &map, camera);
            })
            .expect("draw 1");
        let first_buffer = terminal.backend().buffer().clone();

        terminal
            .draw(|frame| {
                let second = renderer.render_base(frame, Rect::new(0, 0, 40, 20), &map, camera);
                assert_eq!(first, second);
            })
            .expect("draw 2");

        assert!(first.marker_cell(6, 6).is_some());
        assert_eq!(&first_buffer, terminal.backend().buffer());
    }

    #[test]
    fn render_viewport_leaves_outside_and_void_blank() {
        let mut map = MapGrid::filled("demo", MapSize::new(4, 4), TileKind::Grass);
        map.set_tile(1, 1, TileKind::Void);
        let renderer = MapRenderer::builder().build();
        let viewport = Viewport::new(10.0, 5.0).expect("viewport");

        let mut terminal = terminal(10, 5);
        let mut result = ViewportRenderResult::default();
        terminal
            .draw(|frame| {
                result = renderer.render_viewport(frame, Rect::new(0, 0, 10, 5), &map, &viewport);
            })
            .expect("draw");

        assert_eq!(result.columns, 0..10);
        assert_eq!(result.rows, 0..5);
        assert_eq!(result.painted_cells, 15);

        let buffer = terminal.backend().buffer();
        let painted = buffer.cell((0, 0)).expect("cell");
        assert_ne!(painted.bg, Color::Reset);
        assert_eq!(buffer.cell((1, 1)).expect("void").bg, Color::Reset);
        assert_eq!(buffer.cell((9, 4)).expect("outside").bg, Color::Reset);
    }

    #[test]
    fn render_viewport_follows_pan() {
        let mut map = MapGrid::filled("demo", MapSize::new(2, 1), TileKind::Water);
        map.set_tile(1, 0, TileKind::Wall);
        let renderer = MapRenderer::builder().build();
        let mut viewport = Viewport::new(2.0, 1.0).expect("viewport");
        viewport.drag(1.0, 0.0);

        let mut terminal = terminal(2, 1);
        terminal
            .draw(|frame| {
                renderer.render_viewport(frame, Rect::new(0, 0, 2, 1), &map, &viewport);
            })
            .expect("draw");

        let buffer = terminal.backend().buffer();
        // world x 0 moved to the second column
        assert_eq!(buffer.cell((0, 0)).expect("left").bg, Color::Reset);
        let water = TileTheme::standard().paint(TileKind::Water, 0, 0).expect("water");
        assert_eq!(buffer.cell((1, 0)).expect("right").bg, water.background);
    }

    #[test]
    fn cell_to_screen_scales_into_viewport_space() {
        let viewport = Viewport::new(20.0, 10.0).expect("viewport");
        let area = Rect::new(5, 2, 10, 5);
        assert_eq!(cell_to_screen(area, &viewport, 5, 2), Some((1.0, 1.0)));
        assert_eq!(cell_to_screen(area, &viewport, 14, 6), Some((19.0, 9.0)));
        assert_eq!(cell_to_screen(area, &viewport, 4, 2), None);
    }

    #[test]
    fn tilemap_paints_two_pixels_per_cell() {
        let red = [200, 0, 0, 255];
        let blue = [0, 0, 200, 255];
        let image = RgbaImage::from_fn(2, 1, |x, _| Rgba(if x == 0 { red } else { blue }));
        let tileset = Tileset::from_image(&image, 1, 1).expect("tileset");
        let tilemap = Tilemap::new(tileset, vec![vec![0, 1], vec![1, 0]]);
        let viewport = Viewport::new(2.0, 2.0).expect("viewport");

        let mut terminal = terminal(2, 1);
        terminal
            .draw(|frame| paint_tilemap(frame, Rect::new(0, 0, 2, 1), &tilemap, &viewport))
            .expect("draw");

        let buffer = terminal.backend().buffer();
        let left = buffer.cell((0, 0)).expect("left");
        assert_eq!(left.symbol(), HALF_BLOCK);
        assert_eq!((left.fg, left.bg), (Color::Rgb(200, 0, 0), Color::Rgb(0, 0, 200)));
        let right = buffer.cell((1, 0)).expect("right");
        assert_eq!((right.fg, right.bg), (Color::Rgb(0, 0, 200), Color::Rgb(200, 0, 0)));
    }

    #[test]
    fn sprite_paints_over_existing_cells_only_where_opaque() {
        let mut sprite = AnimatedSprite::new(Arc::new(sample_sheet()), Some("idle"), None).expect("sprite");
        sprite.set_position(0.0, 0.0);
        let viewport = Viewport::new(6.0, 4.0).expect("viewport");

        let mut terminal = terminal(6, 2);
        terminal
            .draw(|frame| paint_sprite(frame, Rect::new(0, 0, 6, 2), &sprite, &viewport))
            .expect("draw");

        let buffer = terminal.backend().buffer();
        let cell = buffer.cell((1, 0)).expect("inside");
        assert_eq!(cell.symbol(), HALF_BLOCK);
        assert_eq!((cell.fg, cell.bg), (Color::Rgb(1, 0, 0), Color::Rgb(1, 1, 0)));
        assert_eq!(buffer.cell((5, 0)).expect("outside").symbol(), " ");
    }

    #[test]
    fn half_block_keeps_the_other_half_when_transparent() {
        let mut cell = Cell::default();
        blend_half_block(&mut cell, Some(Color::Red), Some(Color::Blue));
        blend_half_block(&mut cell, None, Some(Color::Green));
        assert_eq!((cell.fg, cell.bg), (Color::Red, Color::Green));
        assert_eq!(pixel_color([1, 2, 3, 10]), None);
    }
}
