//! Unit conversion between U.S. customary and SI units
//!
//! The sensor, display and backend speak miles / mph; zone geometry is defined in
//! meters. Stages convert through these helpers instead of hard-coding factors.

/// Meters in one statute mile
pub const METERS_PER_MILE: f64 = 1609.344;

/// Seconds in one hour
pub const SECONDS_PER_HOUR: f64 = 3600.0;

#[inline]
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

#[inline]
pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

#[inline]
pub fn mph_to_mps(mph: f64) -> f64 {
    mph / SECONDS_PER_HOUR * METERS_PER_MILE
}

#[inline]
pub fn mps_to_mph(mps: f64) -> f64 {
    mps / METERS_PER_MILE * SECONDS_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_miles_to_meters() {
        assert!((miles_to_meters(1.0) - 1609.344).abs() < EPS);
        assert!((miles_to_meters(-0.1) + 160.9344).abs() < EPS);
        assert_eq!(miles_to_meters(0.0), 0.0);
    }

    #[test]
    fn test_meters_to_miles() {
        assert!((meters_to_miles(1609.344) - 1.0).abs() < EPS);
        assert!((meters_to_miles(miles_to_meters(0.02)) - 0.02).abs() < EPS);
    }

    #[test]
    fn test_speed_conversion() {
        // 60 mph = 26.8224 m/s
        assert!((mph_to_mps(60.0) - 26.8224).abs() < EPS);
        assert!((mps_to_mph(26.8224) - 60.0).abs() < EPS);
    }
}
