use shared::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Haversine distance summed over consecutive path points.
pub fn path_distance_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

/// Point reached by traveling `distance_km` from `origin` along the initial
/// bearing `bearing_deg` (0 = north, 90 = east, clockwise), on a spherical
/// Earth model.
pub fn destination_point(origin: Coordinate, distance_km: f64, bearing_deg: f64) -> Coordinate {
    let angular_distance = distance_km / EARTH_RADIUS_KM;
    let bearing = bearing_deg.to_radians();
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();

    let lat2 = f64::asin(
        lat1.sin() * angular_distance.cos() + lat1.cos() * angular_distance.sin() * bearing.cos(),
    );
    let lon2 = lon1
        + f64::atan2(
            bearing.sin() * angular_distance.sin() * lat1.cos(),
            angular_distance.cos() - lat1.sin() * lat2.sin(),
        );

    Coordinate {
        lon: normalize_longitude(lon2.to_degrees()),
        lat: lat2.to_degrees(),
    }
}

pub fn normalize_longitude(lon: f64) -> f64 {
    let mut normalized = lon;
    while normalized < -180.0 {
        normalized += 360.0;
    }
    while normalized > 180.0 {
        normalized -= 360.0;
    }
    normalized
}

pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let mut value = bearing_deg % 360.0;
    if value < 0.0 {
        value += 360.0;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinate { lon: 5.0, lat: 45.0 };
        assert_eq!(haversine_km(point, point), 0.0);
    }

    #[test]
    fn test_haversine_symmetry() {
        let a = Coordinate { lon: 5.0, lat: 45.0 };
        let b = Coordinate { lon: 6.0, lat: 46.0 };
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London, ~343 km
        let paris = Coordinate {
            lon: 2.3522,
            lat: 48.8566,
        };
        let london = Coordinate {
            lon: -0.1278,
            lat: 51.5074,
        };
        let dist = haversine_km(paris, london);
        assert!((dist - 343.0).abs() < 5.0);
    }

    #[test]
    fn test_path_distance_empty() {
        assert_eq!(path_distance_km(&[]), 0.0);
    }

    #[test]
    fn test_path_distance_single_point() {
        let path = vec![Coordinate { lon: 5.0, lat: 45.0 }];
        assert_eq!(path_distance_km(&path), 0.0);
    }

    #[test]
    fn test_destination_point_north() {
        let start = Coordinate { lon: 5.0, lat: 45.0 };
        let dest = destination_point(start, 10.0, 0.0);

        // At 45° latitude, 1° lat ≈ 111km, so 10km north ≈ +0.09° latitude
        assert!((dest.lat - 45.09).abs() < 0.01);
        assert!((dest.lon - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_destination_point_east() {
        let start = Coordinate { lon: 5.0, lat: 45.0 };
        let dest = destination_point(start, 10.0, 90.0);

        assert!((dest.lat - 45.0).abs() < 0.01);
        assert!(dest.lon > 5.0);
        assert!(dest.lon < 5.2);
    }

    #[test]
    fn test_destination_point_south() {
        let start = Coordinate { lon: 5.0, lat: 45.0 };
        let dest = destination_point(start, 10.0, 180.0);

        assert!(dest.lat < 45.0);
        assert!((dest.lat - 44.91).abs() < 0.01);
        assert!((dest.lon - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_destination_point_west() {
        let start = Coordinate { lon: 5.0, lat: 45.0 };
        let dest = destination_point(start, 10.0, 270.0);

        assert!((dest.lat - 45.0).abs() < 0.01);
        assert!(dest.lon < 5.0);
    }

    #[test]
    fn test_destination_point_zero_distance() {
        let start = Coordinate { lon: 5.0, lat: 45.0 };
        let dest = destination_point(start, 0.0, 0.0);

        assert!((dest.lat - start.lat).abs() < 1e-10);
        assert!((dest.lon - start.lon).abs() < 1e-10);
    }

    #[test]
    fn test_destination_point_crosses_antimeridian() {
        let start = Coordinate {
            lon: 179.0,
            lat: 0.0,
        };
        let dest = destination_point(start, 200.0, 90.0);

        // Wraps around to negative longitude
        assert!(dest.lon < -170.0);
        assert!(dest.lon > -180.0);
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(0.0), 0.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(370.0), 10.0);
    }

    #[test]
    fn test_normalize_bearing() {
        assert_eq!(normalize_bearing(0.0), 0.0);
        assert_eq!(normalize_bearing(360.0), 0.0);
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(450.0), 90.0);
    }

    // Property-based tests using proptest
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn valid_coord() -> impl Strategy<Value = Coordinate> {
            (-180.0..=180.0, -90.0..=90.0).prop_map(|(lon, lat)| Coordinate { lon, lat })
        }

        proptest! {
            #[test]
            fn prop_haversine_non_negative(a in valid_coord(), b in valid_coord()) {
                prop_assert!(haversine_km(a, b) >= 0.0);
            }

            #[test]
            fn prop_haversine_symmetric(a in valid_coord(), b in valid_coord()) {
                let dist_ab = haversine_km(a, b);
                let dist_ba = haversine_km(b, a);
                prop_assert!((dist_ab - dist_ba).abs() < 1e-10);
            }

            #[test]
            fn prop_haversine_same_point_is_zero(coord in valid_coord()) {
                prop_assert_eq!(haversine_km(coord, coord), 0.0);
            }

            #[test]
            fn prop_haversine_triangle_inequality(
                a in valid_coord(),
                b in valid_coord(),
                c in valid_coord()
            ) {
                let dist_ab = haversine_km(a, b);
                let dist_bc = haversine_km(b, c);
                let dist_ac = haversine_km(a, c);
                prop_assert!(dist_ac <= dist_ab + dist_bc + 1e-6);
            }

            #[test]
            fn prop_destination_point_returns_valid_coords(
                coord in valid_coord(),
                distance in 0.0..=1000.0,
                bearing in 0.0..360.0
            ) {
                let dest = destination_point(coord, distance, bearing);
                prop_assert!(dest.lat >= -90.0);
                prop_assert!(dest.lat <= 90.0);
                prop_assert!(dest.lon >= -180.0);
                prop_assert!(dest.lon <= 180.0);
            }

            #[test]
            fn prop_destination_point_zero_distance_returns_start(
                coord in valid_coord(),
                bearing in 0.0..360.0
            ) {
                let dest = destination_point(coord, 0.0, bearing);
                prop_assert!((dest.lat - coord.lat).abs() < 1e-9);
                prop_assert!((dest.lon - coord.lon).abs() < 1e-9);
            }

            #[test]
            fn prop_destination_point_travels_requested_distance(
                coord in (-170.0..=170.0, -80.0..=80.0)
                    .prop_map(|(lon, lat)| Coordinate { lon, lat }),
                distance in 1.0..=500.0,
                bearing in 0.0..360.0
            ) {
                let dest = destination_point(coord, distance, bearing);
                let measured = haversine_km(coord, dest);
                prop_assert!((measured - distance).abs() < distance * 0.01 + 0.001);
            }

            #[test]
            fn prop_normalize_longitude_stays_in_range(lon in -1.0e6..1.0e6) {
                let normalized = normalize_longitude(lon);
                prop_assert!(normalized >= -180.0);
                prop_assert!(normalized <= 180.0);
            }

            #[test]
            fn prop_normalize_bearing_stays_in_range(bearing in -1.0e6..1.0e6) {
                let normalized = normalize_bearing(bearing);
                prop_assert!(normalized >= 0.0);
                prop_assert!(normalized < 360.0);
            }
        }
    }
}
