/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Spoken description of how far away something is
///
/// Buckets: up to 100 m, under 500 m, under 1 km, otherwise kilometers
/// rounded to one decimal.
pub fn describe_distance(distance_m: f64) -> String {
    if distance_m <= 100.0 {
        "right here".to_string()
    } else if distance_m < 500.0 {
        "just steps away".to_string()
    } else if distance_m < 1000.0 {
        "a short walk away".to_string()
    } else {
        format!("about {:.1} kilometers away", distance_m / 1000.0)
    }
}
