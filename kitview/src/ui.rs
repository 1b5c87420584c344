use std::sync::OnceLock;

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tui_gamekit::render::{MapRenderer, paint_sprite, paint_tilemap};
use tui_gamekit::viewport::Viewport;

use crate::state::{AppState, Layer, MAP_TILE_WORLD, MapMarker};

const BG: Color = Color::Rgb(16, 18, 24);
const FG: Color = Color::Rgb(230, 228, 218);
const MUTED: Color = Color::Rgb(146, 148, 154);
const ACCENT: Color = Color::Rgb(233, 199, 104);
const START_MARKER: Color = Color::Rgb(150, 180, 220);
const SITE_MARKER: Color = Color::Rgb(240, 188, 126);

const CONTROLS: &str =
    "Pan: WASD/arrows/drag  Zoom: +/-/wheel  G: generator  R: reseed  N: animation  T: layer  C: centre  Q: quit";

static MAP_RENDERER: OnceLock<MapRenderer> = OnceLock::new();

fn map_renderer() -> &'static MapRenderer {
    MAP_RENDERER.get_or_init(|| {
        MapRenderer::builder()
            .world_tile_size(MAP_TILE_WORLD, MAP_TILE_WORLD)
            .build()
    })
}

fn layout(area: Rect) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(4)])
        .split(area);
    [chunks[0], chunks[1]]
}

/// Cells inside the map border for a terminal of `area`.
pub fn map_area(area: Rect) -> Rect {
    let [map, _] = layout(area);
    Block::default().borders(Borders::ALL).inner(map)
}

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let [map_chunk, footer_chunk] = layout(area);

    let title = format!(
        "kitview  {}  seed {:#x}  zoom {:.2}{}",
        state.generator.label(),
        state.seed,
        state.viewport.zoom_level(),
        if state.generating { "  (generating)" } else { "" }
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().bg(BG).fg(FG));
    let map_inner = block.inner(map_chunk);
    frame.render_widget(block, map_chunk);
    render_map(frame, map_inner, state);

    let status = state
        .last_status
        .clone()
        .unwrap_or_else(|| "Generating map...".to_string());
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{:?} layer  ", state.layer),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(sprite_summary(state), Style::default().fg(MUTED)),
        ]),
        Line::from(Span::styled(status, Style::default().fg(FG))),
        Line::from(Span::styled(CONTROLS, Style::default().fg(MUTED))),
    ];
    let footer = Paragraph::new(lines).alignment(Alignment::Left);

    frame.render_widget(footer, footer_chunk);
}

fn sprite_summary(state: &AppState) -> String {
    match &state.sprite {
        Some(sprite) => format!(
            "Sprite {}/{} frame {}{}",
            sprite.current_layer(),
            sprite.current_animation(),
            sprite.frame_index(),
            if sprite.is_stalled() { " (stopped)" } else { "" }
        ),
        None => "No sprite".to_string(),
    }
}

fn render_map(frame: &mut Frame, area: Rect, state: &AppState) {
    if area.width < 4 || area.height < 2 {
        let warning = Paragraph::new("Resize for map view.")
            .style(Style::default().fg(MUTED))
            .alignment(Alignment::Center);
        frame.render_widget(warning, area);
        return;
    }

    match (state.layer, &state.tilemap) {
        (Layer::Tileset, Some(tilemap)) => paint_tilemap(frame, area, tilemap, &state.viewport),
        _ => {
            let Some(level) = &state.level else {
                return;
            };
            map_renderer().render_viewport(frame, area, &level.map, &state.viewport);
            let buf = frame.buffer_mut();
            for marker in &level.markers {
                draw_marker(buf, area, &state.viewport, marker);
            }
        }
    }

    if let Some(sprite) = &state.sprite {
        paint_sprite(frame, area, sprite, &state.viewport);
    }
}

fn draw_marker(buf: &mut Buffer, area: Rect, viewport: &Viewport, marker: &MapMarker) {
    let (wx, wy) = marker.world_pos();
    let Some((column, row)) = world_to_cell(area, viewport, wx, wy) else {
        return;
    };
    let (ch, fg) = if marker.start {
        ('S', START_MARKER)
    } else {
        ('*', SITE_MARKER)
    };
    if let Some(cell) = buf.cell_mut((column, row)) {
        cell.set_fg(fg).set_char(ch);
    }
}

fn world_to_cell(area: Rect, viewport: &Viewport, wx: f32, wy: f32) -> Option<(u16, u16)> {
    let (sx, sy) = viewport.world_to_screen(wx, wy);
    let (screen_w, screen_h) = viewport.screen_size();
    let col = (sx / screen_w * area.width as f32).floor();
    let row = (sy / screen_h * area.height as f32).floor();
    if col < 0.0 || row < 0.0 || col >= area.width as f32 || row >= area.height as f32 {
        return None;
    }
    Some((area.x + col as u16, area.y + row as u16))
}
