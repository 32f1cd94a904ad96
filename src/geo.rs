//! Great-circle distance between listings and users

/// Mean Earth radius in kilometres
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Pairs a latitude and longitude when both are present
pub fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<(f64, f64)> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => None,
    }
}

/// Haversine distance in kilometres between two points given in degrees
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two optional positions, if both are known
pub fn distance_km(from: Option<(f64, f64)>, to: Option<(f64, f64)>) -> Option<f64> {
    let ((lat1, lon1), (lat2, lon2)) = (from?, to?);
    Some(haversine_km(lat1, lon1, lat2, lon2))
}
