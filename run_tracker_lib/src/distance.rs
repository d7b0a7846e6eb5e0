use crate::position_fix::PositionFix;

/// Mean radius of the earth in meters (IUGG).
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle surface distance between two fixes in meters.
pub fn distance_meters(a: &PositionFix, b: &PositionFix) -> f64 {
    haversine_distance((a.latitude, a.longitude), (b.latitude, b.longitude))
}

/// Haversine distance in meters between two (latitude, longitude) pairs given in degrees.
pub fn haversine_distance(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    // abs() keeps the result bit-identical when the arguments are swapped
    let d_lat = (p2.0 - p1.0).abs().to_radians();
    let d_lon = (p2.1 - p1.1).abs().to_radians();
    let lat1 = p1.0.to_radians();
    let lat2 = p2.0.to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::asin(f64::sqrt(a.clamp(0., 1.)));

    EARTH_MEAN_RADIUS_M * c
}
