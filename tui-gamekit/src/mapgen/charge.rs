use crate::core::{MapGrid, MapSize, TileKind};
use crate::procgen::{
    AnchorKind, GenError, GenerateRequest, GeneratedMap, MapGenerator, SeededRng, SpawnAnchor,
};

use super::checked_size;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChargeParams {
    pub positive_charges: u32,
    pub negative_charges: u32,
    /// Scales the mean field value used as the land/water cutoff.
    pub cutoff_multiplier: f64,
}

impl Default for ChargeParams {
    fn default() -> Self {
        Self {
            positive_charges: 10,
            negative_charges: 5,
            cutoff_multiplier: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charge {
    pub x: i32,
    pub y: i32,
    /// `1` or `-1`.
    pub sign: i8,
}

/// Land mask from a field of point charges.
///
/// Every cell sums `sign * strength / distance` over all charges. Cells
/// below `mean * cutoff_multiplier` are zeroed (water); the rest keep their
/// value (land).
#[derive(Clone, Debug)]
pub struct ChargeField {
    size: MapSize,
    strength: f64,
    charges: Vec<Charge>,
    values: Vec<f64>,
    cutoff: f64,
}

impl ChargeField {
    pub fn generate(seed: u64, size: MapSize, params: &ChargeParams) -> Result<Self, GenError> {
        if size.is_empty() {
            return Err(GenError::InvalidSize);
        }
        let total = params.positive_charges as u64 + params.negative_charges as u64;
        if total == 0 {
            return Err(GenError::InvalidParams("at least one charge is required".to_string()));
        }
        if !params.cutoff_multiplier.is_finite() {
            return Err(GenError::InvalidParams("cutoff multiplier must be finite".to_string()));
        }

        let mut rng = SeededRng::new(seed);
        let strength = (size.width as f64 + size.height as f64) / 2.0 / (total as f64).sqrt();

        let charges = (0..total)
            .map(|i| Charge {
                x: rng.range_inclusive(0, size.width as i64) as i32,
                y: rng.range_inclusive(0, size.height as i64) as i32,
                sign: if i < params.positive_charges as u64 { 1 } else { -1 },
            })
            .collect();

        let mut field = Self {
            size,
            strength,
            charges,
            values: Vec::with_capacity(size.tile_count()),
            cutoff: 0.0,
        };

        for y in 0..size.height {
            for x in 0..size.width {
                let value = field.charge_at_point(x as f64, y as f64);
                field.values.push(value);
            }
        }

        let mean = field.values.iter().sum::<f64>() / field.values.len() as f64;
        field.cutoff = mean * params.cutoff_multiplier;
        for value in &mut field.values {
            if *value < field.cutoff {
                *value = 0.0;
            }
        }

        log::debug!(
            "charge field {}x{}: {} charges, cutoff {:.3}",
            size.width,
            size.height,
            total,
            field.cutoff
        );
        Ok(field)
    }

    /// Raw field value at an arbitrary point, before the cutoff is applied.
    pub fn charge_at_point(&self, x: f64, y: f64) -> f64 {
        self.charges
            .iter()
            .map(|charge| {
                let dx = x - charge.x as f64;
                let dy = y - charge.y as f64;
                let distance = (dx * dx + dy * dy).sqrt();
                let contribution = if distance != 0.0 {
                    self.strength / distance
                } else {
                    self.strength
                };
                charge.sign as f64 * contribution
            })
            .sum()
    }

    pub fn size(&self) -> MapSize {
        self.size
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn charges(&self) -> &[Charge] {
        &self.charges
    }

    /// Value after the cutoff; `None` off the map.
    pub fn value(&self, x: u16, y: u16) -> Option<f64> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.values
            .get(y as usize * self.size.width as usize + x as usize)
            .copied()
    }

    pub fn is_land(&self, x: u16, y: u16) -> bool {
        self.value(x, y).is_some_and(|value| value != 0.0)
    }

    /// Land cell with the strongest value, first in row-major order on ties.
    /// Falls back to the origin when everything is water.
    pub fn peak(&self) -> (u16, u16) {
        let mut best = (0usize, f64::MIN);
        for (idx, value) in self.values.iter().enumerate() {
            if *value != 0.0 && *value > best.1 {
                best = (idx, *value);
            }
        }
        let width = self.size.width as usize;
        ((best.0 % width) as u16, (best.0 / width) as u16)
    }

    pub fn to_grid(&self, name: impl Into<String>) -> MapGrid {
        let tiles = self
            .values
            .iter()
            .map(|value| {
                if *value == 0.0 {
                    TileKind::Water
                } else {
                    TileKind::Grass
                }
            })
            .collect();
        MapGrid {
            name: name.into(),
            size: self.size,
            tiles,
        }
    }
}

pub struct ChargeGenerator;

impl MapGenerator<ChargeParams> for ChargeGenerator {
    fn id(&self) -> &'static str {
        "charge"
    }

    fn version(&self) -> u32 {
        1
    }

    fn generate(&self, req: &GenerateRequest<ChargeParams>) -> Result<GeneratedMap, GenError> {
        let size = checked_size(req.width, req.height)?;
        let field = ChargeField::generate(req.seed, size, &req.params)?;
        let (peak_x, peak_y) = field.peak();

        let anchors = vec![SpawnAnchor {
            kind: AnchorKind::PlayerStart,
            x: peak_x,
            y: peak_y,
            tag: Some("peak".to_string()),
        }];

        Ok(GeneratedMap::with_computed_fingerprint(
            self.id(),
            self.version(),
            req.seed,
            field.to_grid("charge"),
            anchors,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_follows_area_and_charge_count() {
        let field = ChargeField::generate(
            0,
            MapSize::new(30, 10),
            &ChargeParams {
                positive_charges: 3,
                negative_charges: 1,
                cutoff_multiplier: 1.0,
            },
        )
        .expect("field");

        assert!((field.strength() - 10.0).abs() < 1e-9);
        assert_eq!(field.charges().len(), 4);
        assert_eq!(field.charges().iter().filter(|c| c.sign == 1).count(), 3);
    }

    #[test]
    fn charge_on_top_of_point_counts_full_strength() {
        let field = ChargeField::generate(
            5,
            MapSize::new(8, 8),
            &ChargeParams {
                positive_charges: 1,
                negative_charges: 0,
                cutoff_multiplier: 1.0,
            },
        )
        .expect("field");

        let charge = field.charges()[0];
        let at_charge = field.charge_at_point(charge.x as f64, charge.y as f64);
        assert!((at_charge - field.strength()).abs() < 1e-9);
        let away = field.charge_at_point(charge.x as f64 + 2.0, charge.y as f64);
        assert!((away - field.strength() / 2.0).abs() < 1e-9);
    }

    #[test]
    fn cutoff_zeroes_values_below_it() {
        let field = ChargeField::generate(11, MapSize::new(40, 40), &ChargeParams::default()).expect("field");
        for y in 0..40 {
            for x in 0..40 {
                let value = field.value(x, y).expect("in bounds");
                assert!(value == 0.0 || value >= field.cutoff());
            }
        }
        assert!(field.value(40, 0).is_none());
    }

    #[test]
    fn higher_cutoff_means_less_land() {
        let loose = ChargeParams {
            cutoff_multiplier: 0.5,
            ..Default::default()
        };
        let strict = ChargeParams {
            cutoff_multiplier: 1.5,
            ..Default::default()
        };
        let size = MapSize::new(50, 50);
        let a = ChargeField::generate(3, size, &loose).expect("loose").to_grid("a");
        let b = ChargeField::generate(3, size, &strict).expect("strict").to_grid("b");
        assert!(a.count(TileKind::Grass) >= b.count(TileKind::Grass));
    }

    #[test]
    fn rejects_zero_charges() {
        let err = ChargeField::generate(
            1,
            MapSize::new(10, 10),
            &ChargeParams {
                positive_charges: 0,
                negative_charges: 0,
                cutoff_multiplier: 1.0,
            },
        )
        .expect_err("should fail");
        assert!(matches!(err, GenError::InvalidParams(_)));
    }

    #[test]
    fn generator_starts_on_land() {
        let generator = ChargeGenerator;
        let req = GenerateRequest::for_generator(&generator, 8, 40, 30, ChargeParams::default());
        let generated = generator.generate(&req).expect("map");
        let start = generated.anchor(&AnchorKind::PlayerStart).expect("start");
        assert_eq!(generated.map.tile_kind(start.x, start.y), TileKind::Grass);
    }
}
