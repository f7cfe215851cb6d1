//! Route thinning and the compact string encoding used for stored paths.
//!
//! Paths are downsampled to a bounded point count, then serialized with the
//! Google polyline delta encoding at 5-decimal precision (~1.1 m). Decoding is
//! exact with respect to the thinned path; malformed stored strings degrade to
//! an empty path rather than failing the caller.

use geo_types::{Coord, LineString};
use shared::Coordinate;

/// Point cap applied by [`encode`] before serialization. Callers that want a
/// smaller stored payload thin further before encoding.
pub const TRANSPORT_MAX_POINTS: usize = 200;

const PRECISION: u32 = 5;

/// Downsample `path` to at most `max_points` points at a fixed stride,
/// always keeping the first and last point of the input.
///
/// The returned path has at most `max_points + 1` points: the final point is
/// appended unconditionally when the stride walk does not land on it.
pub fn thin(path: &[Coordinate], max_points: usize) -> Vec<Coordinate> {
    if max_points == 0 || path.len() <= max_points {
        return path.to_vec();
    }

    let stride = path.len().div_ceil(max_points);
    let mut thinned: Vec<Coordinate> = path.iter().step_by(stride).copied().collect();

    let last = path[path.len() - 1];
    if thinned.last() != Some(&last) {
        thinned.push(last);
    }
    thinned
}

/// Serialize `path` to a polyline string, thinning to the transport cap first.
pub fn encode(path: &[Coordinate]) -> String {
    let thinned = thin(path, TRANSPORT_MAX_POINTS);
    let line: LineString<f64> = thinned
        .iter()
        .map(|c| Coord { x: c.lon, y: c.lat })
        .collect();

    match polyline::encode_coordinates(line, PRECISION) {
        Ok(encoded) => encoded,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode path as polyline");
            String::new()
        }
    }
}

/// Decode a stored polyline string back into longitude/latitude coordinates.
///
/// A malformed string yields an empty path; decoding never fails the caller.
pub fn decode(encoded: &str) -> Vec<Coordinate> {
    if encoded.is_empty() {
        return Vec::new();
    }

    match polyline::decode_polyline(encoded, PRECISION) {
        Ok(line) => line
            .coords()
            .map(|c| Coordinate { lon: c.x, lat: c.y })
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode stored polyline, dropping path");
            Vec::new()
        }
    }
}
