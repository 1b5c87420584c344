//! Pannable, zoomable view onto a 2D world.
//!
//! The viewport maps a screen of `screen_width x screen_height` units onto a
//! rectangle of world space. Screen and world axes point the same way, so
//! screen `(0, 0)` is always the world point `(bounds.min_x, bounds.min_y)`.
//! Zoom level is measured in world units per screen unit: values above 1
//! show more of the world, values below 1 magnify it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ZOOM_IN_FACTOR: f32 = 1.2;
pub const MIN_ZOOM: f32 = 0.2;
pub const MAX_ZOOM: f32 = 5.0;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ViewportError {
    #[error("screen size must be positive, got {width}x{height}")]
    InvalidScreen { width: f32, height: f32 },
    #[error("zoom factor must be greater than 1, got {0}")]
    InvalidZoomFactor(f32),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl WorldRect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    screen_width: f32,
    screen_height: f32,
    bounds: WorldRect,
    zoom_level: f32,
    zoomed_width: f32,
    zoomed_height: f32,
    zoom_in_factor: f32,
    zoom_out_factor: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for Viewport {
    /// 640x480 screen at zoom 1.
    fn default() -> Self {
        Self {
            screen_width: 640.0,
            screen_height: 480.0,
            bounds: WorldRect::new(0.0, 0.0, 640.0, 480.0),
            zoom_level: 1.0,
            zoomed_width: 640.0,
            zoomed_height: 480.0,
            zoom_in_factor: DEFAULT_ZOOM_IN_FACTOR,
            zoom_out_factor: 1.0 / DEFAULT_ZOOM_IN_FACTOR,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Viewport {
    /// Viewport at zoom 1 with the world origin in the screen origin.
    pub fn new(screen_width: f32, screen_height: f32) -> Result<Self, ViewportError> {
        Self::with_zoom_factor(screen_width, screen_height, DEFAULT_ZOOM_IN_FACTOR)
    }

    pub fn with_zoom_factor(
        screen_width: f32,
        screen_height: f32,
        zoom_in_factor: f32,
    ) -> Result<Self, ViewportError> {
        check_screen(screen_width, screen_height)?;
        if !(zoom_in_factor.is_finite() && zoom_in_factor > 1.0) {
            return Err(ViewportError::InvalidZoomFactor(zoom_in_factor));
        }

        Ok(Self {
            screen_width,
            screen_height,
            bounds: WorldRect::new(0.0, 0.0, screen_width, screen_height),
            zoom_level: 1.0,
            zoomed_width: screen_width,
            zoomed_height: screen_height,
            zoom_in_factor,
            zoom_out_factor: 1.0 / zoom_in_factor,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        })
    }

    /// Overrides the exclusive zoom range (defaults `MIN_ZOOM..MAX_ZOOM`).
    pub fn with_zoom_limits(mut self, min_zoom: f32, max_zoom: f32) -> Self {
        self.min_zoom = min_zoom.min(max_zoom);
        self.max_zoom = max_zoom.max(min_zoom);
        self
    }

    pub fn screen_size(&self) -> (f32, f32) {
        (self.screen_width, self.screen_height)
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    pub fn zoomed_size(&self) -> (f32, f32) {
        (self.zoomed_width, self.zoomed_height)
    }

    /// The world rectangle currently on screen; use it as the projection
    /// for panned and zoomed content.
    pub fn projection(&self) -> WorldRect {
        self.bounds
    }

    /// Identity projection for content that ignores pan and zoom, such as a HUD.
    pub fn static_projection(&self) -> WorldRect {
        WorldRect::new(0.0, 0.0, self.screen_width, self.screen_height)
    }

    pub fn screen_to_world(&self, screen_x: f32, screen_y: f32) -> (f32, f32) {
        let rel_x = screen_x / self.screen_width;
        let rel_y = screen_y / self.screen_height;
        (
            self.bounds.min_x + rel_x * self.zoomed_width,
            self.bounds.min_y + rel_y * self.zoomed_height,
        )
    }

    pub fn world_to_screen(&self, world_x: f32, world_y: f32) -> (f32, f32) {
        (
            (world_x - self.bounds.min_x) / self.zoomed_width * self.screen_width,
            (world_y - self.bounds.min_y) / self.zoomed_height * self.screen_height,
        )
    }

    /// Drags the world along with a pointer that moved `(dx, dy)` screen units.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        let world_dx = dx * self.zoom_level;
        let world_dy = dy * self.zoom_level;
        self.bounds.min_x -= world_dx;
        self.bounds.max_x -= world_dx;
        self.bounds.min_y -= world_dy;
        self.bounds.max_y -= world_dy;
    }

    /// Zooms one step around a screen point, keeping the world point under it fixed.
    ///
    /// Positive `scroll` zooms by `zoom_in_factor`, negative by its inverse,
    /// zero does nothing. Steps that would leave the zoom range are ignored.
    /// Returns whether the zoom changed.
    pub fn zoom_at(&mut self, screen_x: f32, screen_y: f32, scroll: f32) -> bool {
        let factor = if scroll > 0.0 {
            self.zoom_in_factor
        } else if scroll < 0.0 {
            self.zoom_out_factor
        } else {
            return false;
        };

        let next = self.zoom_level * factor;
        if !(self.min_zoom < next && next < self.max_zoom) {
            return false;
        }
        self.zoom_level = next;

        let rel_x = screen_x / self.screen_width;
        let rel_y = screen_y / self.screen_height;
        let anchor_x = self.bounds.min_x + rel_x * self.zoomed_width;
        let anchor_y = self.bounds.min_y + rel_y * self.zoomed_height;

        self.zoomed_width *= factor;
        self.zoomed_height *= factor;

        self.bounds = WorldRect::new(
            anchor_x - rel_x * self.zoomed_width,
            anchor_y - rel_y * self.zoomed_height,
            anchor_x + (1.0 - rel_x) * self.zoomed_width,
            anchor_y + (1.0 - rel_y) * self.zoomed_height,
        );
        true
    }

    /// Centres the view on a world point at the current zoom.
    pub fn focus(&mut self, world_x: f32, world_y: f32) {
        let half_w = self.zoomed_width / 2.0;
        let half_h = self.zoomed_height / 2.0;
        self.bounds = WorldRect::new(
            world_x - half_w,
            world_y - half_h,
            world_x + half_w,
            world_y + half_h,
        );
    }

    /// Adopts a new screen size, keeping the top-left world corner and zoom level.
    pub fn resize(&mut self, screen_width: f32, screen_height: f32) -> Result<(), ViewportError> {
        check_screen(screen_width, screen_height)?;
        self.screen_width = screen_width;
        self.screen_height = screen_height;
        self.zoomed_width = screen_width * self.zoom_level;
        self.zoomed_height = screen_height * self.zoom_level;
        self.bounds.max_x = self.bounds.min_x + self.zoomed_width;
        self.bounds.max_y = self.bounds.min_y + self.zoomed_height;
        Ok(())
    }

    /// Tile columns and rows intersecting the view as half-open ranges.
    pub fn visible_tiles(&self, tile_width: f32, tile_height: f32) -> (std::ops::Range<i32>, std::ops::Range<i32>) {
        if tile_width <= 0.0 || tile_height <= 0.0 {
            return (0..0, 0..0);
        }
        let first_col = (self.bounds.min_x / tile_width).floor() as i32;
        let last_col = (self.bounds.max_x / tile_width).ceil() as i32;
        let first_row = (self.bounds.min_y / tile_height).floor() as i32;
        let last_row = (self.bounds.max_y / tile_height).ceil() as i32;
        (first_col..last_col, first_row..last_row)
    }
}

fn check_screen(width: f32, height: f32) -> Result<(), ViewportError> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(ViewportError::InvalidScreen { width, height });
    }
    Ok(())
}
