use std::net::IpAddr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::geo::{GeoPoint, GREENWICH};
use crate::great_circle::DEFAULT_SAMPLES;

pub const DEFAULT_AIRPORTS_URL: &str =
    "https://raw.githubusercontent.com/jpatokal/openflights/master/data/airports.dat";

#[derive(Debug, Clone)]
pub struct Config {
    pub airports_url: String,
    pub geoip_db: String,
    pub device_ip: Option<IpAddr>,
    pub home: GeoPoint,
    pub time_scale: f64,
    pub tick_rate: Duration,
    pub path_samples: usize,
    pub path_altitude: f64,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            airports_url: DEFAULT_AIRPORTS_URL.to_string(),
            geoip_db: "GeoLite2-City.mmdb".to_string(),
            device_ip: None,
            home: GREENWICH,
            time_scale: 1.0,
            tick_rate: Duration::from_millis(100),
            path_samples: DEFAULT_SAMPLES,
            path_altitude: 0.03,
            log_file: "dayline.log".to_string(),
        }
    }
}

impl Config {
    /// Read `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(url) = lookup("DAYLINE_AIRPORTS_URL") {
            config.airports_url = url;
        }
        if let Some(path) = lookup("DAYLINE_GEOIP_DB") {
            config.geoip_db = path;
        }
        if let Some(ip) = lookup("DAYLINE_DEVICE_IP") {
            config.device_ip = Some(parse("DAYLINE_DEVICE_IP", &ip)?);
        }
        if let Some(home) = lookup("DAYLINE_HOME") {
            config.home = parse_lat_lon("DAYLINE_HOME", &home)?;
        }
        if let Some(scale) = lookup("DAYLINE_TIME_SCALE") {
            let scale: f64 = parse("DAYLINE_TIME_SCALE", &scale)?;
            if !scale.is_finite() || scale <= 0.0 {
                return Err(invalid("DAYLINE_TIME_SCALE", &scale.to_string(), "must be positive"));
            }
            config.time_scale = scale;
        }
        if let Some(ms) = lookup("DAYLINE_TICK_MS") {
            let ms: u64 = parse("DAYLINE_TICK_MS", &ms)?;
            if ms == 0 {
                return Err(invalid("DAYLINE_TICK_MS", "0", "must be at least 1"));
            }
            config.tick_rate = Duration::from_millis(ms);
        }
        if let Some(samples) = lookup("DAYLINE_PATH_SAMPLES") {
            let samples: usize = parse("DAYLINE_PATH_SAMPLES", &samples)?;
            if samples == 0 {
                return Err(invalid("DAYLINE_PATH_SAMPLES", "0", "must be at least 1"));
            }
            config.path_samples = samples;
        }
        if let Some(altitude) = lookup("DAYLINE_PATH_ALTITUDE") {
            let altitude: f64 = parse("DAYLINE_PATH_ALTITUDE", &altitude)?;
            if !altitude.is_finite() || altitude < 0.0 {
                return Err(invalid(
                    "DAYLINE_PATH_ALTITUDE",
                    &altitude.to_string(),
                    "must be zero or positive",
                ));
            }
            config.path_altitude = altitude;
        }
        if let Some(log) = lookup("DAYLINE_LOG") {
            config.log_file = log;
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, value, &e.to_string()))
}

/// Parse `"lat,lon"` in degrees.
pub fn parse_lat_lon(key: &'static str, value: &str) -> Result<GeoPoint, ConfigError> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| invalid(key, value, "expected \"lat,lon\""))?;
    let lat: f64 = parse(key, lat)?;
    let lon: f64 = parse(key, lon)?;
    GeoPoint::new(lat, lon).ok_or_else(|| invalid(key, value, "coordinates out of range"))
}
