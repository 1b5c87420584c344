//! Serde model of Aseprite's JSON sprite-sheet export.
//!
//! Both "Hash" and "Array" frame layouts are accepted. Fields the importer
//! does not need are still modelled so an export round-trips through
//! [`SheetExport`] without losing data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetExport {
    pub frames: FrameCollection,
    pub meta: SheetMeta,
}

/// `frames` is an object keyed by filename in the Hash layout and a list
/// of entries carrying their own `filename` in the Array layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameCollection {
    Hash(BTreeMap<String, FrameEntry>),
    Array(Vec<NamedFrameEntry>),
}

impl FrameCollection {
    /// Consumes the collection into `(filename, entry)` pairs.
    pub fn into_named(self) -> Vec<(String, FrameEntry)> {
        match self {
            FrameCollection::Hash(map) => map.into_iter().collect(),
            FrameCollection::Array(list) => list
                .into_iter()
                .map(|named| (named.filename, named.entry))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FrameCollection::Hash(map) => map.len(),
            FrameCollection::Array(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedFrameEntry {
    pub filename: String,
    #[serde(flatten)]
    pub entry: FrameEntry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEntry {
    pub frame: FrameRect,
    #[serde(default)]
    pub rotated: bool,
    #[serde(default)]
    pub trimmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite_source_size: Option<FrameRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_size: Option<FrameSize>,
    /// Milliseconds.
    #[serde(default = "default_duration")]
    pub duration: u32,
}

fn default_duration() -> u32 {
    100
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub w: u32,
    pub h: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMeta {
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<FrameSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(default)]
    pub frame_tags: Vec<FrameTag>,
    #[serde(default)]
    pub layers: Vec<LayerInfo>,
    #[serde(default)]
    pub slices: Vec<Slice>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
    Pingpong,
    PingpongReverse,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameTag {
    pub name: String,
    pub from: u32,
    pub to: u32,
    #[serde(default)]
    pub direction: Direction,
    /// Play count as written by Aseprite (a decimal string); absent means forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl FrameTag {
    pub fn repeat_count(&self) -> Option<u32> {
        self.repeat
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|count| *count > 0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub keys: Vec<SliceKey>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceKey {
    pub frame: u32,
    pub bounds: FrameRect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<FrameRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<SlicePivot>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlicePivot {
    pub x: i32,
    pub y: i32,
}
