use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{MapGrid, TileKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateRequest<P> {
    pub generator_id: String,
    pub generator_version: u32,
    pub seed: u64,
    pub width: u16,
    pub height: u16,
    pub params: P,
}

impl<P> GenerateRequest<P> {
    /// Builds a request stamped with the generator's own id and version.
    pub fn for_generator<G: MapGenerator<P> + ?Sized>(
        generator: &G,
        seed: u64,
        width: u16,
        height: u16,
        params: P,
    ) -> Self {
        Self {
            generator_id: generator.id().to_string(),
            generator_version: generator.version(),
            seed,
            width,
            height,
            params,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorKind {
    PlayerStart,
    Npc,
    Item,
    Encounter,
    Trigger,
    Custom(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnAnchor {
    pub kind: AnchorKind,
    pub x: u16,
    pub y: u16,
    pub tag: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFingerprint {
    pub generator_id: String,
    pub generator_version: u32,
    pub seed: u64,
    pub output_hash_hex: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMap {
    pub map: MapGrid,
    pub anchors: Vec<SpawnAnchor>,
    pub fingerprint: GenerationFingerprint,
}

impl GeneratedMap {
    pub fn with_computed_fingerprint(
        generator_id: impl Into<String>,
        generator_version: u32,
        seed: u64,
        map: MapGrid,
        anchors: Vec<SpawnAnchor>,
    ) -> Self {
        let generator_id = generator_id.into();
        let fingerprint = compute_fingerprint(&generator_id, generator_version, seed, &map, &anchors);
        Self {
            map,
            anchors,
            fingerprint,
        }
    }

    pub fn anchor(&self, kind: &AnchorKind) -> Option<&SpawnAnchor> {
        self.anchors.iter().find(|anchor| &anchor.kind == kind)
    }
}

pub trait MapGenerator<P>: Send + Sync {
    fn id(&self) -> &'static str;
    fn version(&self) -> u32;
    fn generate(&self, req: &GenerateRequest<P>) -> Result<GeneratedMap, GenError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenError {
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("invalid map size")]
    InvalidSize,
    #[error("internal generation error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Seeded PRNG (splitmix64)
// ---------------------------------------------------------------------------

/// Small deterministic generator shared by every map generator.
///
/// Output depends only on the seed, so the same request always yields the
/// same map and fingerprint on every platform.
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self { state: mix64(seed) }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = mix64(self.state.wrapping_add(0x9e37_79b9_7f4a_7c15));
        self.state
    }

    pub fn next_bounded(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.next_u64() % bound
    }

    /// Uniform integer in `low..=high`; returns `low` when the range is empty.
    pub fn range_inclusive(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let span = (high - low) as u64 + 1;
        low + self.next_bounded(span) as i64
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

pub fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

pub fn compute_fingerprint(
    generator_id: &str,
    generator_version: u32,
    seed: u64,
    map: &MapGrid,
    anchors: &[SpawnAnchor],
) -> GenerationFingerprint {
    let mut hash = 1469598103934665603u64;

    fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
        for byte in bytes {
            *hash ^= *byte as u64;
            *hash = hash.wrapping_mul(1099511628211);
        }
    }

    fn hash_str(hash: &mut u64, value: &str) {
        hash_bytes(hash, value.as_bytes());
        hash_bytes(hash, &[0xff]);
    }

    fn hash_tile(hash: &mut u64, tile: TileKind) {
        match tile {
            TileKind::Void => hash_bytes(hash, &[0]),
            TileKind::Grass => hash_bytes(hash, &[1]),
            TileKind::Trail => hash_bytes(hash, &[2]),
            TileKind::Sand => hash_bytes(hash, &[3]),
            TileKind::Floor => hash_bytes(hash, &[4]),
            TileKind::Wall => hash_bytes(hash, &[5]),
            TileKind::Water => hash_bytes(hash, &[6]),
            TileKind::Custom(id) => {
                hash_bytes(hash, &[7]);
                hash_bytes(hash, &id.to_le_bytes());
            }
        }
    }

    fn hash_anchor_kind(hash: &mut u64, kind: &AnchorKind) {
        match kind {
            AnchorKind::PlayerStart => hash_bytes(hash, &[10]),
            AnchorKind::Npc => hash_bytes(hash, &[11]),
            AnchorKind::Item => hash_bytes(hash, &[12]),
            AnchorKind::Encounter => hash_bytes(hash, &[13]),
            AnchorKind::Trigger => hash_bytes(hash, &[14]),
            AnchorKind::Custom(label) => {
                hash_bytes(hash, &[15]);
                hash_str(hash, label);
            }
        }
    }

    hash_str(&mut hash, generator_id);
    hash_bytes(&mut hash, &generator_version.to_le_bytes());
    hash_bytes(&mut hash, &seed.to_le_bytes());

    hash_str(&mut hash, &map.name);
    hash_bytes(&mut hash, &map.size.width.to_le_bytes());
    hash_bytes(&mut hash, &map.size.height.to_le_bytes());
    for tile in &map.tiles {
        hash_tile(&mut hash, *tile);
    }

    hash_bytes(&mut hash, &(anchors.len() as u64).to_le_bytes());
    for anchor in anchors {
        hash_anchor_kind(&mut hash, &anchor.kind);
        hash_bytes(&mut hash, &anchor.x.to_le_bytes());
        hash_bytes(&mut hash, &anchor.y.to_le_bytes());
        hash_str(&mut hash, anchor.tag.as_deref().unwrap_or(""));
    }

    GenerationFingerprint {
        generator_id: generator_id.to_string(),
        generator_version,
        seed,
        output_hash_hex: format!("{:016x}", hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MapSize;

    fn start_anchor() -> Vec<SpawnAnchor> {
        vec![SpawnAnchor {
            kind: AnchorKind::PlayerStart,
            x: 2,
            y: 2,
            tag: None,
        }]
    }

    #[test]
    fn fingerprint_is_stable_for_same_input() {
        let map = MapGrid::filled("demo", MapSize::new(4, 4), TileKind::Grass);
        let a = compute_fingerprint("demo-gen", 1, 42, &map, &start_anchor());
        let b = compute_fingerprint("demo-gen", 1, 42, &map, &start_anchor());
        assert_eq!(a.output_hash_hex, b.output_hash_hex);
    }

    #[test]
    fn fingerprint_changes_when_version_changes() {
        let map = MapGrid::filled("demo", MapSize::new(4, 4), TileKind::Grass);
        let v1 = compute_fingerprint("demo-gen", 1, 42, &map, &start_anchor());
        let v2 = compute_fingerprint("demo-gen", 2, 42, &map, &start_anchor());
        assert_ne!(v1.output_hash_hex, v2.output_hash_hex);
    }

    #[test]
    fn fingerprint_distinguishes_void_from_grass() {
        let grass = MapGrid::filled("demo", MapSize::new(2, 2), TileKind::Grass);
        let void = MapGrid::filled("demo", MapSize::new(2, 2), TileKind::Void);
        let a = compute_fingerprint("demo-gen", 1, 1, &grass, &[]);
        let b = compute_fingerprint("demo-gen", 1, 1, &void, &[]);
        assert_ne!(a.output_hash_hex, b.output_hash_hex);
    }

    #[test]
    fn seeded_rng_is_deterministic_and_bounded() {
        let mut a = SeededRng::new(7);
        let mut b = SeededRng::new(7);
        for _ in 0..64 {
            assert_eq!(a.next_u64(), b.next_u64());
        }

        let mut rng = SeededRng::new(99);
        for _ in 0..256 {
            let v = rng.range_inclusive(-2, 3);
            assert!((-2..=3).contains(&v));
            let f = rng.next_f64();
            assert!((0.0..1.0).contains(&f));
        }
        assert_eq!(rng.range_inclusive(5, 5), 5);
        assert_eq!(rng.next_bounded(0), 0);
    }
}
