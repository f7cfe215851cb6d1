//! Partition a path into per-day segments by cumulative distance.

use shared::Coordinate;

use crate::geo::{haversine_km, path_distance_km};

/// Split `path` into `days` contiguous segments of roughly equal distance.
///
/// Adjacent segments share exactly one boundary point, so concatenating the
/// segments while dropping each segment's first point (after the first
/// segment) reconstructs the original path. With `days <= 1`, a zero-length
/// path distance, or fewer than two points, the whole path is returned as a
/// single segment.
///
/// A cut is forced once only just enough points remain to give every
/// outstanding day at least two points, so the walk can overshoot the distance
/// target and still produce the requested segment count; the trailing segment
/// may then be as short as the path's final edge. Day counts larger than the
/// number of edges are clamped.
pub fn split_by_distance(path: &[Coordinate], days: usize) -> Vec<Vec<Coordinate>> {
    if days <= 1 || path.len() < 2 {
        return vec![path.to_vec()];
    }
    let total = path_distance_km(path);
    if total == 0.0 {
        return vec![path.to_vec()];
    }

    let days = days.min(path.len() - 1);
    let target = total / days as f64;

    let mut segments: Vec<Vec<Coordinate>> = Vec::with_capacity(days);
    let mut current = vec![path[0]];
    let mut accumulated = 0.0;

    for i in 1..path.len() {
        accumulated += haversine_km(path[i - 1], path[i]);
        current.push(path[i]);

        let cuts_remaining = days - 1 - segments.len();
        let points_after = path.len() - 1 - i;
        let forced = points_after == cuts_remaining;

        if cuts_remaining > 0 && i < path.len() - 1 && (accumulated >= target || forced) {
            segments.push(current);
            // boundary point is shared with the next segment
            current = vec![path[i]];
            accumulated = 0.0;
        }
    }

    segments.push(current);
    segments
}
