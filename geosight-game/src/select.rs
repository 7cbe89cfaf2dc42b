//! Round target selection and coordinate jitter.
use rand::Rng;
use thiserror::Error;

use crate::catalog::{City, CityCatalog, Difficulty, GeoPoint};

/// Default jitter radius in decimal degrees, applied to each axis.
pub const DEFAULT_JITTER_RADIUS: f64 = 0.01;
/// Jittered coordinates are rounded to this many decimal places.
pub const JITTER_DECIMALS: i32 = 6;

/// Selection failures. `EmptyCatalog` is user-facing and recoverable by
/// relaxing the difficulty ceiling; the caller must not start a round on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("no cities at or below difficulty {ceiling}")]
    EmptyCatalog { ceiling: Difficulty },
}

/// Draw one city uniformly at random from the catalog slice at or below the
/// difficulty ceiling.
///
/// # Errors
///
/// Returns `SelectError::EmptyCatalog` when the filter leaves no candidates.
pub fn pick_city<'a, R: Rng>(
    catalog: &'a CityCatalog,
    ceiling: Difficulty,
    rng: &mut R,
) -> Result<&'a City, SelectError> {
    let pool = catalog.filtered(ceiling);
    if pool.is_empty() {
        return Err(SelectError::EmptyCatalog { ceiling });
    }
    let index = rng.gen_range(0..pool.len());
    Ok(pool[index])
}

/// Offset each axis independently by a uniform draw from `[-radius, radius]`,
/// rounding the result to a fixed precision so display coordinates stay short.
pub fn jitter_point<R: Rng>(center: GeoPoint, radius: f64, rng: &mut R) -> GeoPoint {
    if radius <= 0.0 {
        return GeoPoint::new(round_coord(center.lat), round_coord(center.lon));
    }
    let lat = center.lat + rng.gen_range(-radius..=radius);
    let lon = center.lon + rng.gen_range(-radius..=radius);
    GeoPoint::new(round_coord(lat), round_coord(lon))
}

fn round_coord(value: f64) -> f64 {
    let scale = 10f64.powi(JITTER_DECIMALS);
    (value * scale).round() / scale
}
