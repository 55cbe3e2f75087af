//! Great-circle distance for the distributor locator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Invalid coordinate input.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    /// Latitude outside `-90..=90` or not finite.
    #[error("latitude {0} is out of range")]
    Latitude(f64),
    /// Longitude outside `-180..=180` or not finite.
    #[error("longitude {0} is out of range")]
    Longitude(f64),
}

/// A validated WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Build a point, rejecting out-of-range or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] naming the offending component.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Distance to another point in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(*self, *other)
    }
}

/// Something that may sit on the map.
pub trait Located {
    /// Position, if known.
    fn coordinates(&self) -> Option<Coordinates>;
}

impl Located for Coordinates {
    fn coordinates(&self) -> Option<Coordinates> {
        Some(*self)
    }
}

/// Haversine distance between two points, in kilometres.
#[must_use]
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Clamp guards against h drifting just above 1.0 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// The `limit` items closest to `origin`, nearest first.
///
/// Items without coordinates are skipped. Ties keep their input order.
#[must_use]
pub fn nearest<T: Located>(origin: Coordinates, items: &[T], limit: usize) -> Vec<(&T, f64)> {
    let mut ranked: Vec<(&T, f64)> = items
        .iter()
        .filter_map(|item| {
            item.coordinates()
                .map(|point| (item, haversine_km(origin, point)))
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Shop {
        name: &'static str,
        at: Option<Coordinates>,
    }

    impl Located for Shop {
        fn coordinates(&self) -> Option<Coordinates> {
            self.at
        }
    }

    fn point(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    fn santiago() -> Coordinates {
        point(-33.4489, -70.6693)
    }

    #[test]
    fn test_zero_distance() {
        assert!(haversine_km(santiago(), santiago()).abs() < 1e-9);
    }

    #[test]
    fn test_santiago_valparaiso() {
        let valparaiso = point(-33.0472, -71.6127);
        let d = haversine_km(santiago(), valparaiso);
        assert!((d - 98.4).abs() < 2.0, "got {d}");
    }

    #[test]
    fn test_santiago_concepcion_is_symmetric() {
        let concepcion = point(-36.8201, -73.0444);
        let there = haversine_km(santiago(), concepcion);
        let back = haversine_km(concepcion, santiago());
        assert!((there - back).abs() < 1e-9);
        assert!((there - 435.0).abs() < 10.0, "got {there}");
    }

    #[test]
    fn test_quarter_meridian() {
        let d = haversine_km(point(0.0, 0.0), point(90.0, 0.0));
        let expected = EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2;
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn test_coordinate_validation() {
        assert_eq!(Coordinates::new(91.0, 0.0), Err(GeoError::Latitude(91.0)));
        assert_eq!(
            Coordinates::new(0.0, -180.5),
            Err(GeoError::Longitude(-180.5))
        );
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_nearest_orders_and_skips_unlocated() {
        let shops = [
            Shop {
                name: "concepcion",
                at: Some(point(-36.8201, -73.0444)),
            },
            Shop {
                name: "sin-direccion",
                at: None,
            },
            Shop {
                name: "providencia",
                at: Some(point(-33.4314, -70.6093)),
            },
            Shop {
                name: "valparaiso",
                at: Some(point(-33.0472, -71.6127)),
            },
        ];

        let found = nearest(santiago(), &shops, 10);
        let names: Vec<_> = found.iter().map(|(shop, _)| shop.name).collect();
        assert_eq!(names, ["providencia", "valparaiso", "concepcion"]);
        assert!(found.windows(2).all(|w| w[0].1 <= w[1].1));

        let top = nearest(santiago(), &shops, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0.name, "providencia");
    }

    #[test]
    fn test_nearest_with_zero_limit() {
        assert!(nearest(santiago(), &[santiago()], 0).is_empty());
    }
}
