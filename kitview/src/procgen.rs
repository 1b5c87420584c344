use tui_gamekit::mapgen::{
    ChargeGenerator, ChargeParams, DrunkWalkGenerator, DrunkWalkParams, VoronoiGenerator,
    VoronoiParams,
};
use tui_gamekit::procgen::{AnchorKind, GenError, GenerateRequest, GeneratedMap, MapGenerator, SpawnAnchor};

use crate::state::{GeneratedLevel, GeneratorKind, MapMarker, MapState};

pub fn generate_level(
    generator: GeneratorKind,
    seed: u64,
    width: u16,
    height: u16,
) -> Result<GeneratedLevel, GenError> {
    let generated = match generator {
        GeneratorKind::DrunkWalk => {
            let params = DrunkWalkParams {
                max_steps: Some(width as u32 * height as u32),
                ..Default::default()
            };
            run(&DrunkWalkGenerator, seed, width, height, params)?
        }
        GeneratorKind::Voronoi => {
            let seed_count = ((width as u32 * height as u32) / 160).clamp(4, 64);
            run(&VoronoiGenerator, seed, width, height, VoronoiParams { seed_count })?
        }
        GeneratorKind::Charge => run(&ChargeGenerator, seed, width, height, ChargeParams::default())?,
    };

    log::info!(
        "generated {} {}x{} seed {:#x} -> {}",
        generator.label(),
        width,
        height,
        seed,
        generated.fingerprint.output_hash_hex
    );

    Ok(GeneratedLevel {
        markers: generated.anchors.into_iter().map(marker).collect(),
        map: MapState::from_grid(generated.map),
        generator,
        seed: generated.fingerprint.seed,
        fingerprint: generated.fingerprint.output_hash_hex,
    })
}

fn run<G, P>(generator: &G, seed: u64, width: u16, height: u16, params: P) -> Result<GeneratedMap, GenError>
where
    G: MapGenerator<P>,
{
    let request = GenerateRequest::for_generator(generator, seed, width, height, params);
    generator.generate(&request)
}

fn marker(anchor: SpawnAnchor) -> MapMarker {
    let SpawnAnchor { kind, x, y, tag } = anchor;
    MapMarker {
        x,
        y,
        start: kind == AnchorKind::PlayerStart,
        tag,
    }
}

/// Next seed in a deterministic reseed chain.
pub fn next_seed(seed: u64) -> u64 {
    tui_gamekit::procgen::mix64(seed ^ 0x6b69_7476_6965_77)
}
