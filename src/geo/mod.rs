use serde::{Deserialize, Serialize};

use crate::error::AppError;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A geographic point. Latitude must be within [-90, 90] and longitude within
/// [-180, 180]; out-of-range values are a caller contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);

        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(AppError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Great-circle distance between two valid coordinates, in kilometers.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> Result<f64, AppError> {
    a.validate()?;
    b.validate()?;

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    Ok(EARTH_RADIUS_KM * central_angle)
}

/// Shop position and delivery radius, fixed at startup and injected into the
/// services that need them.
#[derive(Debug, Clone, Copy)]
pub struct GeoConfig {
    shop: Coordinate,
    max_radius_km: f64,
}

impl GeoConfig {
    pub fn new(shop: Coordinate, max_radius_km: f64) -> Result<Self, AppError> {
        shop.validate()?;
        Ok(Self {
            shop,
            max_radius_km,
        })
    }

    pub fn max_radius_km(&self) -> f64 {
        self.max_radius_km
    }

    pub fn distance_to_shop(&self, point: &Coordinate) -> Result<f64, AppError> {
        distance_km(point, &self.shop)
    }

    /// A point exactly on the radius boundary counts as deliverable.
    pub fn is_deliverable(&self, point: &Coordinate) -> Result<bool, AppError> {
        Ok(self.distance_to_shop(point)? <= self.max_radius_km)
    }
}

/// Renders sub-kilometer distances in meters, everything else in kilometers
/// with one decimal. Presentation only.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else {
        format!("{km:.1} km")
    }
}
