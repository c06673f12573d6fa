use std::env;

use crate::error::AppError;
use crate::geo::Coordinate;
use crate::money::Money;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub shop_latitude: f64,
    pub shop_longitude: f64,
    pub max_delivery_radius_km: f64,
    pub delivery_fee_cents: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            // The shop in Avinashi, Tiruppur.
            shop_latitude: parse_or_default("SHOP_LATITUDE", 11.197708)?,
            shop_longitude: parse_or_default("SHOP_LONGITUDE", 77.268123)?,
            max_delivery_radius_km: parse_or_default("MAX_DELIVERY_RADIUS_KM", 50.0)?,
            delivery_fee_cents: parse_or_default("DELIVERY_FEE_CENTS", 299)?,
        })
    }

    pub fn shop_location(&self) -> Coordinate {
        Coordinate::new(self.shop_latitude, self.shop_longitude)
    }

    pub fn delivery_fee(&self) -> Money {
        Money::from_cents(self.delivery_fee_cents)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
