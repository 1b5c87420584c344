use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::{Animation, AnimationFrame, AsepriteError, SpriteSheet};

/// What happened to an [`AnimatedSprite`] during an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnimationEvent {
    /// The current animation wrapped around to its first frame.
    Looped,
    /// A scheduled animation took over.
    Switched { layer: String, animation: String },
    /// The animation ended and nothing was scheduled; the sprite holds its
    /// last frame until a new animation is set or scheduled.
    Stalled,
}

/// Sprite playing animations from a shared [`SpriteSheet`].
///
/// Positions are world coordinates of the frame anchor. With a y-down world
/// [`AnimatedSprite::position`] is the top-left corner of the frame.
#[derive(Clone, Debug)]
pub struct AnimatedSprite {
    sheet: Arc<SpriteSheet>,
    current: Animation,
    frame_index: usize,
    elapsed: Duration,
    passes: u32,
    stalled: bool,
    scheduled: VecDeque<(Option<String>, String)>,
    x: f32,
    y: f32,
}

impl AnimatedSprite {
    /// Starts on `animation`/`layer`, defaulting to the first tag and layer of the sheet.
    pub fn new(
        sheet: Arc<SpriteSheet>,
        animation: Option<&str>,
        layer: Option<&str>,
    ) -> Result<Self, AsepriteError> {
        let animation = match animation {
            Some(name) => name.to_string(),
            None => sheet
                .available_animations()
                .first()
                .cloned()
                .ok_or(AsepriteError::NoAnimations)?,
        };
        let layer = match layer {
            Some(name) => name.to_string(),
            None => sheet
                .available_layers()
                .first()
                .cloned()
                .ok_or(AsepriteError::NoAnimations)?,
        };
        let current = lookup(&sheet, &layer, &animation)?;

        let mut sprite = Self {
            sheet,
            current,
            frame_index: 0,
            elapsed: Duration::ZERO,
            passes: 0,
            stalled: false,
            scheduled: VecDeque::new(),
            x: 0.0,
            y: 0.0,
        };
        sprite.stall_on_terminal_start();
        Ok(sprite)
    }

    pub fn sheet(&self) -> &Arc<SpriteSheet> {
        &self.sheet
    }

    pub fn current_animation(&self) -> &str {
        &self.current.tag
    }

    pub fn current_layer(&self) -> &str {
        &self.current.layer
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn current_frame(&self) -> &AnimationFrame {
        &self.current.frames[self.frame_index]
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn scheduled_len(&self) -> usize {
        self.scheduled.len()
    }

    /// Switches animation. `None` keeps the current tag or layer. Returns
    /// whether playback restarted; an unchanged selection only restarts with
    /// `force_reset`.
    pub fn set_animation(
        &mut self,
        animation: Option<&str>,
        layer: Option<&str>,
        force_reset: bool,
    ) -> Result<bool, AsepriteError> {
        let animation = animation.unwrap_or(&self.current.tag).to_string();
        let layer = layer.unwrap_or(&self.current.layer).to_string();
        let next = lookup(&self.sheet, &layer, &animation)?;

        if !force_reset && next.layer == self.current.layer && next.tag == self.current.tag {
            return Ok(false);
        }
        self.start(next);
        Ok(true)
    }

    /// Queues an animation to play once the current one finishes a pass.
    /// A stalled sprite switches right away. A `None` layer means whatever
    /// layer is current when the switch happens.
    pub fn schedule_animation(&mut self, animation: &str, layer: Option<&str>) -> Result<(), AsepriteError> {
        let check_layer = layer.unwrap_or(&self.current.layer);
        lookup(&self.sheet, check_layer, animation)?;

        self.scheduled
            .push_back((layer.map(str::to_string), animation.to_string()));
        if self.stalled {
            self.pop_scheduled();
        }
        Ok(())
    }

    /// Advances playback by `dt`. Returns the last event that occurred.
    pub fn update(&mut self, dt: Duration) -> Option<AnimationEvent> {
        if self.stalled {
            return None;
        }

        self.elapsed += dt;
        let mut last = None;
        while !self.stalled {
            let Some(duration) = self.current_frame().duration else {
                break;
            };
            if self.elapsed < duration {
                break;
            }
            self.elapsed -= duration;
            if let Some(event) = self.advance() {
                last = Some(event);
            }
        }
        last
    }

    fn advance(&mut self) -> Option<AnimationEvent> {
        let next = self.frame_index + 1;
        if next < self.current.frames.len() {
            self.frame_index = next;
            if self.current_frame().duration.is_none() {
                return Some(self.end_of_animation());
            }
            return None;
        }

        self.passes += 1;
        if let Some(event) = self.pop_scheduled() {
            return Some(event);
        }
        if self.current.repeat.is_some_and(|repeat| self.passes >= repeat) {
            return Some(self.stall());
        }
        self.frame_index = 0;
        if self.current_frame().duration.is_none() {
            return Some(self.end_of_animation());
        }
        Some(AnimationEvent::Looped)
    }

    fn end_of_animation(&mut self) -> AnimationEvent {
        match self.pop_scheduled() {
            Some(event) => event,
            None => self.stall(),
        }
    }

    fn stall(&mut self) -> AnimationEvent {
        log::warn!(
            "animation '{}' ended with nothing scheduled; holding frame {}",
            self.current.name(),
            self.frame_index
        );
        self.stalled = true;
        self.elapsed = Duration::ZERO;
        AnimationEvent::Stalled
    }

    fn pop_scheduled(&mut self) -> Option<AnimationEvent> {
        while let Some((layer, animation)) = self.scheduled.pop_front() {
            let layer = layer.unwrap_or_else(|| self.current.layer.clone());
            match lookup(&self.sheet, &layer, &animation) {
                Ok(next) => {
                    // a terminal first frame may hand over to the next entry
                    self.start(next);
                    if self.stalled {
                        return Some(AnimationEvent::Stalled);
                    }
                    return Some(AnimationEvent::Switched {
                        layer: self.current.layer.clone(),
                        animation: self.current.tag.clone(),
                    });
                }
                Err(err) => log::warn!("skipping scheduled animation: {err}"),
            }
        }
        None
    }

    fn start(&mut self, animation: Animation) {
        log::trace!("sprite animation -> {}", animation.name());
        self.current = animation;
        self.frame_index = 0;
        self.elapsed = Duration::ZERO;
        self.passes = 0;
        self.stalled = false;
        self.stall_on_terminal_start();
    }

    /// An animation whose first frame is terminal never plays; treat it as ended.
    fn stall_on_terminal_start(&mut self) {
        if self.current_frame().duration.is_none() {
            self.end_of_animation();
        }
    }

    /// Top-left corner of the current frame in world space.
    pub fn position(&self) -> (f32, f32) {
        let region = self.current_frame().region;
        (self.x - region.anchor_x as f32, self.y - region.anchor_y as f32)
    }

    /// Anchor point in world space.
    pub fn anchor_position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (u32, u32) {
        let region = self.current_frame().region;
        (region.w, region.h)
    }

    pub fn midpoint(&self) -> (f32, f32) {
        let (x, y) = self.position();
        let (w, h) = self.size();
        (x + w as f32 / 2.0, y + h as f32 / 2.0)
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Places the frame's top-left corner at `(x, y)`.
    pub fn set_position(&mut self, x: f32, y: f32) {
        let region = self.current_frame().region;
        self.x = x + region.anchor_x as f32;
        self.y = y + region.anchor_y as f32;
    }

    /// Places the anchor point at `(x, y)`.
    pub fn set_anchor_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// `(min_x, min_y, max_x, max_y)` of the current frame.
    pub fn aabb(&self) -> (f32, f32, f32, f32) {
        let (x, y) = self.position();
        let (w, h) = self.size();
        (x, y, x + w as f32, y + h as f32)
    }

    /// Pixel of the current frame at world `(wx, wy)`, `None` outside it or
    /// when the sheet has no image.
    pub fn pixel_at_world(&self, wx: f32, wy: f32) -> Option<[u8; 4]> {
        let (x, y) = self.position();
        let (px, py) = ((wx - x).floor(), (wy - y).floor());
        if px < 0.0 || py < 0.0 {
            return None;
        }
        self.sheet
            .region_pixel(&self.current_frame().region, px as u32, py as u32)
    }
}

fn lookup(sheet: &SpriteSheet, layer: &str, animation: &str) -> Result<Animation, AsepriteError> {
    sheet
        .animation(layer, animation)
        .cloned()
        .ok_or_else(|| AsepriteError::UnknownAnimation {
            layer: layer.to_string(),
            animation: animation.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aseprite::tests::sample_sheet;
    use pretty_assertions::assert_eq;

    const TICK: Duration = Duration::from_millis(100);

    fn sprite(animation: &str) -> AnimatedSprite {
        AnimatedSprite::new(Arc::new(sample_sheet()), Some(animation), None).expect("sprite")
    }

    /// "twice" plays two passes, "blink" is a lone 1 ms frame.
    fn single_layer_sprite(animation: &str) -> AnimatedSprite {
        let json = r#"{
            "frames": {
                "Layer_twice_0": {"frame": {"x": 0, "y": 0, "w": 1, "h": 1}, "duration": 100},
                "Layer_twice_1": {"frame": {"x": 1, "y": 0, "w": 1, "h": 1}, "duration": 100},
                "Layer_blink_0": {"frame": {"x": 2, "y": 0, "w": 1, "h": 1}, "duration": 1},
                "Layer_walk_0": {"frame": {"x": 3, "y": 0, "w": 1, "h": 1}, "duration": 100}
            },
            "meta": {"frameTags": [
                {"name": "twice", "from": 0, "to": 1, "repeat": "2"},
                {"name": "blink", "from": 2, "to": 2},
                {"name": "walk", "from": 3, "to": 3}
            ]}
        }"#;
        let sheet = SpriteSheet::from_json_str(json, crate::aseprite::SheetOptions::default()).expect("sheet");
        AnimatedSprite::new(Arc::new(sheet), Some(animation), None).expect("sprite")
    }

    #[test]
    fn defaults_to_first_tag_and_layer() {
        let sprite = AnimatedSprite::new(Arc::new(sample_sheet()), None, None).expect("sprite");
        assert_eq!(sprite.current_animation(), "idle");
        assert_eq!(sprite.current_layer(), "body");
    }

    #[test]
    fn unknown_animation_is_rejected() {
        let err = AnimatedSprite::new(Arc::new(sample_sheet()), Some("fly"), None).expect_err("should fail");
        assert!(matches!(err, AsepriteError::UnknownAnimation { .. }));

        let mut sprite = sprite("idle");
        assert!(sprite.set_animation(None, Some("cape"), false).is_err());
        assert!(sprite.schedule_animation("fly", None).is_err());
        assert_eq!(sprite.current_animation(), "idle");
    }

    #[test]
    fn frames_advance_with_elapsed_time() {
        let mut sprite = sprite("walk");
        assert_eq!(sprite.update(Duration::from_millis(60)), None);
        assert_eq!(sprite.frame_index(), 0);
        assert_eq!(sprite.update(Duration::from_millis(60)), None);
        assert_eq!(sprite.frame_index(), 1);
        assert_eq!(sprite.update(Duration::from_millis(200)), None);
        assert_eq!(sprite.frame_index(), 3);
        assert_eq!(sprite.update(TICK), Some(AnimationEvent::Looped));
        assert_eq!(sprite.frame_index(), 0);
    }

    #[test]
    fn scheduled_animation_waits_for_end_of_pass() {
        let mut sprite = sprite("idle");
        sprite.schedule_animation("walk", None).expect("schedule");
        assert_eq!(sprite.scheduled_len(), 1);

        assert_eq!(sprite.update(TICK), None);
        assert_eq!(sprite.current_animation(), "idle");
        assert_eq!(
            sprite.update(TICK),
            Some(AnimationEvent::Switched {
                layer: "body".to_string(),
                animation: "walk".to_string()
            })
        );
        assert_eq!(sprite.current_animation(), "walk");
        assert_eq!(sprite.frame_index(), 0);
        assert_eq!(sprite.scheduled_len(), 0);
    }

    #[test]
    fn scheduled_layer_is_resolved_at_switch_time() {
        let mut sprite = sprite("idle");
        sprite.schedule_animation("walk", None).expect("schedule");
        sprite.set_animation(None, Some("hat"), false).expect("set");
        assert_eq!(sprite.scheduled_len(), 1);

        sprite.update(TICK * 2);
        assert_eq!(sprite.current_layer(), "hat");
        assert_eq!(sprite.current_animation(), "walk");
    }

    #[test]
    fn terminal_frame_without_queue_stalls() {
        let mut sprite = sprite("die");
        assert_eq!(sprite.update(TICK), Some(AnimationEvent::Stalled));
        assert!(sprite.is_stalled());
        assert_eq!(sprite.frame_index(), 1);
        assert_eq!(sprite.update(TICK * 10), None);
        assert_eq!(sprite.frame_index(), 1);
    }

    #[test]
    fn terminal_frame_hands_over_to_queue() {
        let mut sprite = sprite("die");
        sprite.schedule_animation("idle", Some("hat")).expect("schedule");
        assert_eq!(
            sprite.update(TICK),
            Some(AnimationEvent::Switched {
                layer: "hat".to_string(),
                animation: "idle".to_string()
            })
        );
        assert!(!sprite.is_stalled());
    }

    #[test]
    fn scheduling_on_a_stalled_sprite_switches_immediately() {
        let mut sprite = sprite("die");
        sprite.update(TICK);
        assert!(sprite.is_stalled());

        sprite.schedule_animation("walk", None).expect("schedule");
        assert!(!sprite.is_stalled());
        assert_eq!(sprite.current_animation(), "walk");
        assert_eq!(sprite.scheduled_len(), 0);
    }

    #[test]
    fn repeat_count_stalls_on_last_frame() {
        let mut sprite = single_layer_sprite("twice");
        assert_eq!(sprite.update(TICK), None);
        assert_eq!(sprite.update(TICK), Some(AnimationEvent::Looped));
        assert_eq!(sprite.frame_index(), 0);

        assert_eq!(sprite.update(TICK), None);
        assert_eq!(sprite.update(TICK), Some(AnimationEvent::Stalled));
        assert!(sprite.is_stalled());
        assert_eq!(sprite.frame_index(), 1);
        assert_eq!(sprite.update(TICK * 5), None);
        assert_eq!(sprite.frame_index(), 1);
    }

    #[test]
    fn terminal_first_frame_stalls_at_once() {
        let mut sprite = single_layer_sprite("blink");
        assert!(sprite.is_stalled());
        assert_eq!(sprite.frame_index(), 0);
        assert_eq!(sprite.update(TICK), None);
    }

    #[test]
    fn switch_through_terminal_animation_names_the_one_playing() {
        let mut sprite = single_layer_sprite("twice");
        sprite.schedule_animation("blink", None).expect("blink");
        sprite.schedule_animation("walk", None).expect("walk");

        assert_eq!(
            sprite.update(TICK * 2),
            Some(AnimationEvent::Switched {
                layer: "Layer".to_string(),
                animation: "walk".to_string()
            })
        );
        assert_eq!(sprite.current_animation(), "walk");
        assert!(!sprite.is_stalled());
        assert_eq!(sprite.scheduled_len(), 0);
    }

    #[test]
    fn set_animation_only_restarts_when_asked() {
        let mut sprite = sprite("walk");
        sprite.update(TICK);
        assert_eq!(sprite.frame_index(), 1);

        assert!(!sprite.set_animation(Some("walk"), None, false).expect("same"));
        assert_eq!(sprite.frame_index(), 1);
        assert!(sprite.set_animation(Some("walk"), None, true).expect("forced"));
        assert_eq!(sprite.frame_index(), 0);
        assert!(sprite.set_animation(Some("idle"), None, false).expect("other"));
        assert_eq!(sprite.current_animation(), "idle");
    }

    #[test]
    fn geometry_follows_the_anchor() {
        let mut sprite = sprite("idle");
        sprite.set_anchor_position(10.0, 20.0);
        assert_eq!(sprite.position(), (8.0, 18.0));
        assert_eq!(sprite.size(), (4, 4));
        assert_eq!(sprite.midpoint(), (10.0, 20.0));
        assert_eq!(sprite.aabb(), (8.0, 18.0, 12.0, 22.0));

        sprite.move_by(1.0, -2.0);
        assert_eq!(sprite.anchor_position(), (11.0, 18.0));

        sprite.set_position(0.0, 0.0);
        assert_eq!(sprite.anchor_position(), (2.0, 2.0));
        assert_eq!(sprite.position(), (0.0, 0.0));
    }

    #[test]
    fn pixels_come_from_the_current_frame() {
        let mut sprite = sprite("idle");
        sprite.set_position(100.0, 50.0);
        assert_eq!(sprite.pixel_at_world(101.0, 53.5), Some([1, 3, 0, 255]));
        assert_eq!(sprite.pixel_at_world(99.0, 50.0), None);
        assert_eq!(sprite.pixel_at_world(104.0, 50.0), None);

        sprite.update(TICK);
        assert_eq!(sprite.pixel_at_world(100.0, 50.0), Some([4, 0, 0, 255]));
    }
}
