use std::time::Duration;

use ratatui::layout::Rect;
use tui_dispatch::DispatchResult;
use tui_gamekit::aseprite::AnimationEvent;
use tui_gamekit::render::cell_to_screen;

use crate::action::Action;
use crate::effect::Effect;
use crate::procgen::next_seed;
use crate::state::{AppState, Layer, viewport_screen_size};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.last_status = Some("Generating map...".to_string());
            request_map(state)
        }
        Action::MapGenerated(level) => {
            state.apply_level(level);
            DispatchResult::changed()
        }
        Action::GenerationFailed(reason) => {
            state.generating = false;
            state.last_status = Some(format!("Map generation failed: {reason}"));
            DispatchResult::changed()
        }
        Action::NextGenerator => {
            state.generator = state.generator.next();
            request_map(state)
        }
        Action::Reseed => {
            state.seed = next_seed(state.seed);
            request_map(state)
        }
        Action::ViewResize {
            x,
            y,
            width,
            height,
        } => {
            let area = Rect::new(x, y, width, height);
            if area == state.view_area {
                return DispatchResult::unchanged();
            }
            let (screen_w, screen_h) = viewport_screen_size(area);
            if let Err(err) = state.viewport.resize(screen_w, screen_h) {
                log::warn!("ignoring resize to {width}x{height}: {err}");
                return DispatchResult::unchanged();
            }
            state.view_area = area;
            DispatchResult::changed()
        }
        Action::ViewPan { dx, dy } => {
            // screen units: one per column, two per row
            state.viewport.drag(-(dx as f32), -(dy as f32) * 2.0);
            DispatchResult::changed()
        }
        Action::ViewZoom { at, steps } => handle_zoom(state, at, steps),
        Action::ViewCenter => {
            let Some((cx, cy)) = state.map().map(|map| map.world_center()) else {
                return DispatchResult::unchanged();
            };
            state.viewport.focus(cx, cy);
            DispatchResult::changed()
        }
        Action::DragStart { column, row } => {
            if !contains(state.view_area, column, row) {
                return DispatchResult::unchanged();
            }
            state.drag_from = Some((column, row));
            DispatchResult::unchanged()
        }
        Action::DragMove { column, row } => {
            let Some((from_col, from_row)) = state.drag_from else {
                return DispatchResult::unchanged();
            };
            let dx = column as f32 - from_col as f32;
            let dy = (row as f32 - from_row as f32) * 2.0;
            state.drag_from = Some((column, row));
            if dx == 0.0 && dy == 0.0 {
                return DispatchResult::unchanged();
            }
            state.viewport.drag(dx, dy);
            DispatchResult::changed()
        }
        Action::DragEnd => {
            state.drag_from = None;
            DispatchResult::unchanged()
        }
        Action::NextAnimation => handle_next_animation(state),
        Action::ToggleLayer => {
            if state.tilemap.is_none() {
                state.last_status = Some("No tileset loaded (--tileset).".to_string());
                return DispatchResult::changed();
            }
            state.layer = match state.layer {
                Layer::Generated => Layer::Tileset,
                Layer::Tileset => Layer::Generated,
            };
            DispatchResult::changed()
        }
        Action::Tick(elapsed_ms) => handle_tick(state, elapsed_ms),
    }
}

fn request_map(state: &mut AppState) -> DispatchResult<Effect> {
    state.generating = true;
    DispatchResult::changed_with(Effect::GenerateMap {
        generator: state.generator,
        seed: state.seed,
        width: state.map_width,
        height: state.map_height,
    })
}

fn handle_zoom(state: &mut AppState, at: Option<(u16, u16)>, steps: i8) -> DispatchResult<Effect> {
    if steps == 0 {
        return DispatchResult::unchanged();
    }
    let (screen_w, screen_h) = state.viewport.screen_size();
    let (sx, sy) = at
        .and_then(|(column, row)| cell_to_screen(state.view_area, &state.viewport, column, row))
        .unwrap_or((screen_w / 2.0, screen_h / 2.0));

    let scroll = steps.signum() as f32;
    let mut zoomed = false;
    for _ in 0..steps.unsigned_abs() {
        zoomed |= state.viewport.zoom_at(sx, sy, scroll);
    }
    if !zoomed {
        return DispatchResult::unchanged();
    }
    DispatchResult::changed()
}

fn handle_next_animation(state: &mut AppState) -> DispatchResult<Effect> {
    let Some(sprite) = state.sprite.as_mut() else {
        state.last_status = Some("No sprite loaded (--sprite-json/--sprite-image).".to_string());
        return DispatchResult::changed();
    };

    let names = sprite.sheet().available_animations().to_vec();
    let current = names
        .iter()
        .position(|name| name == sprite.current_animation())
        .unwrap_or(0);
    let Some(next) = names.get((current + 1) % names.len().max(1)) else {
        return DispatchResult::unchanged();
    };

    match sprite.schedule_animation(next, None) {
        Ok(()) if sprite.current_animation() == next.as_str() => {
            state.last_status = Some(format!("Playing '{next}'"));
        }
        Ok(()) => {
            state.last_status = Some(format!("Queued '{next}'"));
        }
        Err(err) => {
            state.last_status = Some(err.to_string());
        }
    }
    DispatchResult::changed()
}

fn handle_tick(state: &mut AppState, elapsed_ms: u32) -> DispatchResult<Effect> {
    let Some(sprite) = state.sprite.as_mut() else {
        return DispatchResult::unchanged();
    };
    let before = sprite.frame_index();
    let event = sprite.update(Duration::from_millis(elapsed_ms as u64));

    match event {
        Some(AnimationEvent::Switched { animation, .. }) => {
            state.last_status = Some(format!("Playing '{animation}'"));
            DispatchResult::changed()
        }
        Some(AnimationEvent::Stalled) => {
            state.last_status = Some(format!(
                "'{}' finished; press N to queue another animation",
                sprite.current_animation()
            ));
            DispatchResult::changed()
        }
        Some(AnimationEvent::Looped) => DispatchResult::changed(),
        None if sprite.frame_index() != before => DispatchResult::changed(),
        None => DispatchResult::unchanged(),
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tui_dispatch::EffectStore;
    use tui_gamekit::aseprite::{AnimatedSprite, SheetOptions, SpriteSheet};
    use tui_gamekit::tilemap::{Tilemap, Tileset};

    use super::*;
    use crate::procgen::generate_level;
    use crate::state::GeneratorKind;

    const SHEET: &str = r#"{
        "frames": {
            "Layer_idle_0": {"frame": {"x": 0, "y": 0, "w": 2, "h": 2}, "duration": 100},
            "Layer_idle_1": {"frame": {"x": 2, "y": 0, "w": 2, "h": 2}, "duration": 100},
            "Layer_pop_0": {"frame": {"x": 4, "y": 0, "w": 2, "h": 2}, "duration": 100},
            "Layer_pop_1": {"frame": {"x": 6, "y": 0, "w": 2, "h": 2}, "duration": 1}
        },
        "meta": {"frameTags": [
            {"name": "idle", "from": 0, "to": 1},
            {"name": "pop", "from": 2, "to": 3}
        ]}
    }"#;

    fn state() -> AppState {
        AppState::new(42, GeneratorKind::DrunkWalk, 30, 20)
    }

    fn with_sprite(mut state: AppState) -> AppState {
        let sheet = SpriteSheet::from_json_str(SHEET, SheetOptions::default())
            .expect("sheet")
            .with_image(image::RgbaImage::new(8, 2))
            .expect("image");
        state.sprite = Some(AnimatedSprite::new(Arc::new(sheet), None, None).expect("sprite"));
        state
    }

    fn resized(mut state: AppState) -> AppState {
        let _ = reducer(
            &mut state,
            Action::ViewResize {
                x: 1,
                y: 1,
                width: 40,
                height: 10,
            },
        );
        state
    }

    #[test]
    fn init_requests_a_map() {
        let mut store = EffectStore::new(state(), reducer);
        let result = store.dispatch(Action::Init);
        assert!(result.changed);
        assert_eq!(
            result.effects,
            vec![Effect::GenerateMap {
                generator: GeneratorKind::DrunkWalk,
                seed: 42,
                width: 30,
                height: 20,
            }]
        );
        assert!(store.state().generating);
    }

    #[test]
    fn next_generator_cycles_and_regenerates() {
        let mut state = state();
        let result = reducer(&mut state, Action::NextGenerator);
        assert_eq!(state.generator, GeneratorKind::Voronoi);
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::GenerateMap {
                generator: GeneratorKind::Voronoi,
                ..
            }]
        ));
    }

    #[test]
    fn reseed_changes_seed_deterministically() {
        let mut a = state();
        let mut b = state();
        let _ = reducer(&mut a, Action::Reseed);
        let _ = reducer(&mut b, Action::Reseed);
        assert_ne!(a.seed, 42);
        assert_eq!(a.seed, b.seed);
    }

    #[test]
    fn generated_map_is_centred() {
        let mut state = resized(state());
        let level = generate_level(GeneratorKind::Charge, 5, 30, 20).expect("level");
        let _ = reducer(&mut state, Action::MapGenerated(level));

        assert!(!state.generating);
        assert!(state.level.is_some());
        let center = state.viewport.projection().center();
        assert!((center.0 - 120.0).abs() < 1e-3);
        assert!((center.1 - 80.0).abs() < 1e-3);
    }

    #[test]
    fn generation_failure_is_reported() {
        let mut state = state();
        state.generating = true;
        let _ = reducer(&mut state, Action::GenerationFailed("invalid map size".to_string()));
        assert!(!state.generating);
        assert_eq!(
            state.last_status.as_deref(),
            Some("Map generation failed: invalid map size")
        );
    }

    #[test]
    fn resize_tracks_half_block_rows() {
        let state = resized(state());
        assert_eq!(state.view_area, Rect::new(1, 1, 40, 10));
        assert_eq!(state.viewport.screen_size(), (40.0, 20.0));
    }

    #[test]
    fn pan_moves_camera_in_cells() {
        let mut state = resized(state());
        let before = state.viewport.projection();
        let _ = reducer(&mut state, Action::ViewPan { dx: 3, dy: -1 });
        let after = state.viewport.projection();
        assert!((after.min_x - before.min_x - 3.0).abs() < 1e-3);
        assert!((after.min_y - before.min_y + 2.0).abs() < 1e-3);
    }

    #[test]
    fn drag_follows_the_mouse() {
        let mut state = resized(state());
        let before = state.viewport.projection();

        let _ = reducer(&mut state, Action::DragStart { column: 10, row: 5 });
        let result = reducer(&mut state, Action::DragMove { column: 14, row: 6 });
        assert!(result.changed);
        let _ = reducer(&mut state, Action::DragEnd);
        let after = state.viewport.projection();
        assert!((after.min_x - (before.min_x - 4.0)).abs() < 1e-3);
        assert!((after.min_y - (before.min_y - 2.0)).abs() < 1e-3);

        let result = reducer(&mut state, Action::DragMove { column: 20, row: 6 });
        assert!(!result.changed);
    }

    #[test]
    fn drag_outside_the_map_is_ignored() {
        let mut state = resized(state());
        let _ = reducer(&mut state, Action::DragStart { column: 0, row: 0 });
        assert_eq!(state.drag_from, None);
    }

    #[test]
    fn zoom_keeps_the_cell_under_the_cursor() {
        let mut state = resized(state());
        let anchor = cell_to_screen(state.view_area, &state.viewport, 30, 8).expect("inside");
        let before = state.viewport.screen_to_world(anchor.0, anchor.1);

        let result = reducer(
            &mut state,
            Action::ViewZoom {
                at: Some((30, 8)),
                steps: -2,
            },
        );
        assert!(result.changed);
        assert!(state.viewport.zoom_level() < 1.0);
        let after = state.viewport.screen_to_world(anchor.0, anchor.1);
        assert!((before.0 - after.0).abs() < 1e-2);
        assert!((before.1 - after.1).abs() < 1e-2);
    }

    #[test]
    fn zoom_stops_at_the_limit() {
        let mut state = resized(state());
        let _ = reducer(&mut state, Action::ViewZoom { at: None, steps: 127 });
        assert!(state.viewport.zoom_level() < 5.0);
        let result = reducer(&mut state, Action::ViewZoom { at: None, steps: 1 });
        assert!(!result.changed);
    }

    #[test]
    fn toggle_layer_needs_a_tileset() {
        let mut state = state();
        let _ = reducer(&mut state, Action::ToggleLayer);
        assert_eq!(state.layer, Layer::Generated);

        let tileset = Tileset::from_image(&image::RgbaImage::new(4, 4), 2, 2).expect("tileset");
        state.tilemap = Some(Tilemap::new(tileset, vec![vec![0, 1]]));
        let _ = reducer(&mut state, Action::ToggleLayer);
        assert_eq!(state.layer, Layer::Tileset);
    }

    #[test]
    fn tick_advances_the_sprite() {
        let mut state = with_sprite(state());
        let result = reducer(&mut state, Action::Tick(50));
        assert!(!result.changed);
        let result = reducer(&mut state, Action::Tick(60));
        assert!(result.changed);
        assert_eq!(state.sprite.as_ref().expect("sprite").frame_index(), 1);
    }

    #[test]
    fn next_animation_queues_until_loop_end() {
        let mut state = with_sprite(state());
        let _ = reducer(&mut state, Action::NextAnimation);
        assert_eq!(state.last_status.as_deref(), Some("Queued 'pop'"));

        let _ = reducer(&mut state, Action::Tick(200));
        assert_eq!(state.sprite.as_ref().expect("sprite").current_animation(), "pop");

        let _ = reducer(&mut state, Action::Tick(100));
        assert!(state.sprite.as_ref().expect("sprite").is_stalled());
        assert_eq!(
            state.last_status.as_deref(),
            Some("'pop' finished; press N to queue another animation")
        );

        // a stalled sprite switches right away
        let _ = reducer(&mut state, Action::NextAnimation);
        assert_eq!(state.last_status.as_deref(), Some("Playing 'idle'"));
    }

    #[test]
    fn sprite_actions_without_sprite_report_status() {
        let mut state = state();
        let _ = reducer(&mut state, Action::NextAnimation);
        assert!(state.last_status.is_some());
        assert!(!reducer(&mut state, Action::Tick(16)).changed);
    }
}
