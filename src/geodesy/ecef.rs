use super::types::Geodetic;

/// Earth-Centered-Earth-Fixed position or direction, meters.
pub type Ecef = [f64; 3];

// WGS-84
pub const WGS84_A_M: f64 = 6_378_137.0;
pub const WGS84_E2: f64 = 6.694_379_990_14e-3;

/// Closed-form geodetic to ECEF conversion on the WGS84 ellipsoid.
pub fn to_ecef(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Ecef {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let n = WGS84_A_M / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let x = (n + alt_m) * cos_lat * lon.cos();
    let y = (n + alt_m) * cos_lat * lon.sin();
    let z = (n * (1.0 - WGS84_E2) + alt_m) * sin_lat;
    [x, y, z]
}

pub fn distance(p1: Ecef, p2: Ecef) -> f64 {
    let dx = p1[0] - p2[0];
    let dy = p1[1] - p2[1];
    let dz = p1[2] - p2[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Unit vector pointing from `from` to `to`, with the distance between them.
/// `None` when the two points coincide.
pub fn line_of_sight(from: Ecef, to: Ecef) -> Option<(Ecef, f64)> {
    let range = distance(to, from);
    if range == 0.0 {
        return None;
    }
    let unit = [
        (to[0] - from[0]) / range,
        (to[1] - from[1]) / range,
        (to[2] - from[2]) / range,
    ];
    Some((unit, range))
}

/// Observer-to-satellite unit vector in ECEF. Zero vector when the points coincide.
pub fn unit_line_of_sight(satellite: &Geodetic, observer: &Geodetic) -> Ecef {
    line_of_sight(observer.to_ecef(), satellite.to_ecef())
        .map(|(unit, _)| unit)
        .unwrap_or([0.0, 0.0, 0.0])
}
