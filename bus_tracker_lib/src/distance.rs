use geo_types::Point;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters. Points are `x = longitude, y = latitude` in degrees.
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let d_lat = (p2.y() - p1.y()).to_radians();
    let d_lon = (p2.x() - p1.x()).to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = a.clamp(0., 1.);
    let c = 2. * f64::atan2(a.sqrt(), (1. - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn is_valid_position(point: Point) -> bool {
    let (lon, lat) = (point.x(), point.y());
    lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Distance between two optional positions. `None` when either side is missing or invalid.
pub fn checked_distance(p1: Option<Point>, p2: Option<Point>) -> Option<f64> {
    let (p1, p2) = (p1?, p2?);
    if !is_valid_position(p1) || !is_valid_position(p2) {
        return None;
    }
    Some(haversine_distance(p1, p2))
}
