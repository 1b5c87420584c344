//! Aseprite sprite-sheet importer.
//!
//! Expects a sheet exported with "Split Layers" and "Split Tags" and the
//! filename format `{layer}_{tag}_{tagframe}`. Every (layer, tag) pair
//! becomes one [`Animation`] named `{layer}_{tag}`.

mod format;
mod sprite;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use image::RgbaImage;
use thiserror::Error;

pub use format::{
    Direction, FrameCollection, FrameEntry, FrameRect, FrameSize, FrameTag, LayerInfo,
    NamedFrameEntry, SheetExport, SheetMeta, Slice, SliceKey, SlicePivot,
};
pub use sprite::{AnimatedSprite, AnimationEvent};

/// Layer used when the export lists no layers.
pub const DEFAULT_LAYER: &str = "Layer";

/// Frames shorter than this end their animation instead of being shown.
pub const TERMINAL_FRAME_THRESHOLD: Duration = Duration::from_millis(2);

#[derive(Debug, Error)]
pub enum AsepriteError {
    #[error("failed to read sprite sheet: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid sprite sheet json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to load sprite sheet image: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame '{0}' is missing from the export")]
    MissingFrame(String),
    #[error("tag '{name}' has an invalid frame range {from}..={to}")]
    InvalidTag { name: String, from: u32, to: u32 },
    #[error("sprite sheet defines no animations")]
    NoAnimations,
    #[error("no animation '{animation}' on layer '{layer}'")]
    UnknownAnimation { layer: String, animation: String },
    #[error("sprite sheet has no image attached")]
    NoImage,
    #[error("frame region {x},{y} {w}x{h} exceeds image {image_width}x{image_height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        image_width: u32,
        image_height: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetOptions {
    /// Anchor frames at half their width instead of the left edge.
    pub center_x: bool,
    /// Anchor frames at half their height instead of the top edge.
    pub center_y: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            center_x: true,
            center_y: true,
        }
    }
}

/// Sub-rectangle of the sheet image plus the point that sits on the
/// sprite's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub anchor_x: u32,
    pub anchor_y: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationFrame {
    pub region: Region,
    /// `None` marks a terminal frame.
    pub duration: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Animation {
    pub layer: String,
    pub tag: String,
    /// Playback order, already expanded for the tag direction.
    pub frames: Vec<AnimationFrame>,
    /// Number of passes before the animation ends; `None` loops forever.
    pub repeat: Option<u32>,
}

impl Animation {
    pub fn name(&self) -> String {
        SpriteSheet::sequence_name(&self.layer, &self.tag)
    }

    pub fn is_looping(&self) -> bool {
        self.repeat.is_none() && self.frames.iter().all(|frame| frame.duration.is_some())
    }

    pub fn total_duration(&self) -> Duration {
        self.frames.iter().filter_map(|frame| frame.duration).sum()
    }
}

#[derive(Clone, Debug)]
pub struct SpriteSheet {
    meta: SheetMeta,
    layers: Vec<String>,
    animation_names: Vec<String>,
    animations: HashMap<String, Animation>,
    image: Option<RgbaImage>,
}

impl SpriteSheet {
    pub fn sequence_name(layer: &str, tag: &str) -> String {
        format!("{layer}_{tag}")
    }

    pub fn from_export(export: SheetExport, options: SheetOptions) -> Result<Self, AsepriteError> {
        let SheetExport { frames, meta } = export;
        let frames: HashMap<String, FrameEntry> = frames.into_named().into_iter().collect();

        let mut seen = HashSet::new();
        let mut layers: Vec<String> = meta
            .layers
            .iter()
            .filter(|layer| seen.insert(layer.name.clone()))
            .map(|layer| layer.name.clone())
            .collect();
        if layers.is_empty() {
            layers.push(DEFAULT_LAYER.to_string());
        }

        let mut seen = HashSet::new();
        let animation_names: Vec<String> = meta
            .frame_tags
            .iter()
            .filter(|tag| seen.insert(tag.name.clone()))
            .map(|tag| tag.name.clone())
            .collect();

        let mut animations = HashMap::new();
        for layer in &layers {
            for tag in &meta.frame_tags {
                let name = Self::sequence_name(layer, &tag.name);
                if animations.contains_key(&name) {
                    continue;
                }
                let animation = build_animation(layer, tag, &frames, options)?;
                animations.insert(name, animation);
            }
        }

        log::debug!(
            "sprite sheet '{}': {} layers, {} tags, {} frames",
            meta.image,
            layers.len(),
            animation_names.len(),
            frames.len()
        );

        Ok(Self {
            meta,
            layers,
            animation_names,
            animations,
            image: None,
        })
    }

    pub fn from_json_str(json: &str, options: SheetOptions) -> Result<Self, AsepriteError> {
        let export: SheetExport = serde_json::from_str(json)?;
        Self::from_export(export, options)
    }

    pub fn from_json_slice(bytes: &[u8], options: SheetOptions) -> Result<Self, AsepriteError> {
        let export: SheetExport = serde_json::from_slice(bytes)?;
        Self::from_export(export, options)
    }

    /// Reads the JSON export only; attach pixels with [`SpriteSheet::attach_image`].
    pub fn open(json_path: impl AsRef<Path>, options: SheetOptions) -> Result<Self, AsepriteError> {
        let json = std::fs::read_to_string(json_path)?;
        Self::from_json_str(&json, options)
    }

    /// Reads the JSON export and its image.
    pub fn load(
        image_path: impl AsRef<Path>,
        json_path: impl AsRef<Path>,
        options: SheetOptions,
    ) -> Result<Self, AsepriteError> {
        let mut sheet = Self::open(json_path, options)?;
        let image = image::open(image_path)?.to_rgba8();
        sheet.attach_image(image)?;
        Ok(sheet)
    }

    /// Attaches the sheet image, checking that every frame region fits in it.
    pub fn attach_image(&mut self, image: RgbaImage) -> Result<(), AsepriteError> {
        let (image_width, image_height) = image.dimensions();
        for animation in self.animations.values() {
            for frame in &animation.frames {
                let Region { x, y, w, h, .. } = frame.region;
                if x as u64 + w as u64 > image_width as u64 || y as u64 + h as u64 > image_height as u64 {
                    return Err(AsepriteError::RegionOutOfBounds {
                        x,
                        y,
                        w,
                        h,
                        image_width,
                        image_height,
                    });
                }
            }
        }
        self.image = Some(image);
        Ok(())
    }

    pub fn with_image(mut self, image: RgbaImage) -> Result<Self, AsepriteError> {
        self.attach_image(image)?;
        Ok(self)
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn meta(&self) -> &SheetMeta {
        &self.meta
    }

    pub fn animation(&self, layer: &str, tag: &str) -> Option<&Animation> {
        self.animations.get(&Self::sequence_name(layer, tag))
    }

    /// Tag names in export order.
    pub fn available_animations(&self) -> &[String] {
        &self.animation_names
    }

    /// Layer names in export order.
    pub fn available_layers(&self) -> &[String] {
        &self.layers
    }

    /// Pixel inside a frame region; `None` without an image or outside the region.
    pub fn region_pixel(&self, region: &Region, px: u32, py: u32) -> Option<[u8; 4]> {
        if px >= region.w || py >= region.h {
            return None;
        }
        let image = self.image.as_ref()?;
        image
            .get_pixel_checked(region.x + px, region.y + py)
            .map(|pixel| pixel.0)
    }

    /// Copies a frame's pixels out of the sheet.
    pub fn frame_image(&self, frame: &AnimationFrame) -> Result<RgbaImage, AsepriteError> {
        let image = self.image.as_ref().ok_or(AsepriteError::NoImage)?;
        let Region { x, y, w, h, .. } = frame.region;
        if x as u64 + w as u64 > image.width() as u64 || y as u64 + h as u64 > image.height() as u64 {
            return Err(AsepriteError::RegionOutOfBounds {
                x,
                y,
                w,
                h,
                image_width: image.width(),
                image_height: image.height(),
            });
        }
        Ok(image::imageops::crop_imm(image, x, y, w, h).to_image())
    }
}

fn build_animation(
    layer: &str,
    tag: &FrameTag,
    frames: &HashMap<String, FrameEntry>,
    options: SheetOptions,
) -> Result<Animation, AsepriteError> {
    let invalid = || AsepriteError::InvalidTag {
        name: tag.name.clone(),
        from: tag.from,
        to: tag.to,
    };
    let last = tag.to.checked_sub(tag.from).ok_or_else(invalid)?;
    last.checked_add(1).ok_or_else(invalid)?;

    let mut sequence = Vec::new();
    for index in 0..=last {
        let key = format!("{layer}_{}_{index}", tag.name);
        let entry = frames
            .get(&key)
            .ok_or_else(|| AsepriteError::MissingFrame(key.clone()))?;
        sequence.push(to_animation_frame(entry, options));
    }

    Ok(Animation {
        layer: layer.to_string(),
        tag: tag.name.clone(),
        frames: apply_direction(sequence, tag.direction),
        repeat: tag.repeat_count(),
    })
}

fn to_animation_frame(entry: &FrameEntry, options: SheetOptions) -> AnimationFrame {
    let FrameRect { x, y, w, h } = entry.frame;
    let duration = Duration::from_millis(entry.duration as u64);
    AnimationFrame {
        region: Region {
            x,
            y,
            w,
            h,
            anchor_x: if options.center_x { w / 2 } else { 0 },
            anchor_y: if options.center_y { h / 2 } else { 0 },
        },
        duration: (duration >= TERMINAL_FRAME_THRESHOLD).then_some(duration),
    }
}

/// Expands frames into playback order. Ping-pong variants do not repeat
/// the turning frames, so a loop of `0 1 2` plays `0 1 2 1`.
fn apply_direction<T: Clone>(frames: Vec<T>, direction: Direction) -> Vec<T> {
    fn bounce<T: Clone>(mut frames: Vec<T>) -> Vec<T> {
        if frames.len() > 2 {
            let back: Vec<T> = frames[1..frames.len() - 1].iter().rev().cloned().collect();
            frames.extend(back);
        }
        frames
    }

    match direction {
        Direction::Forward => frames,
        Direction::Reverse => frames.into_iter().rev().collect(),
        Direction::Pingpong => bounce(frames),
        Direction::PingpongReverse => bounce(frames.into_iter().rev().collect()),
    }
}
