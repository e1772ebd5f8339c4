//! Planar projection used by the spatiotemporal matcher.
//!
//! Positions arrive as WGS84 degrees; distances are measured in metres on
//! the spherical web-mercator plane, matching the projection the sampling
//! programmes use for proximity work.

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Forward web-mercator projection: (lat, lon) degrees → (x, y) metres.
pub fn project(lat: f64, lon: f64) -> (f64, f64) {
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Euclidean distance between two projected points, in metres.
pub fn planar_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equator_longitude_degree_is_about_111km() {
        let a = project(0.0, 0.0);
        let b = project(0.0, 1.0);
        let d = planar_distance(a, b);
        assert!((d - 111_319.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn projection_is_monotonic_in_latitude() {
        let low = project(64.0, -22.0);
        let high = project(64.1, -22.0);
        assert!(high.1 > low.1);
    }
}
