use maxminddb::geoip2::City;
use maxminddb::Reader;
use std::net::IpAddr;
use std::path::Path;
use tracing::{info, warn};

use crate::geo::GeoPoint;

/// Where the globe starts facing, and where the home marker sits.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceLocation {
    pub position: GeoPoint,
    pub label: String,
    pub resolved: bool,
}

pub struct GeoResolver {
    reader: Option<Reader<Vec<u8>>>,
}

impl GeoResolver {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        let db_path = db_path.as_ref();
        let reader = Reader::open_readfile(db_path).ok();
        if reader.is_none() {
            warn!(path = %db_path.display(), "GeoIP database unavailable, device location disabled");
        }
        Self { reader }
    }

    pub fn lookup(&self, ip: IpAddr) -> Option<(GeoPoint, String)> {
        if ip.is_loopback() || ip.is_unspecified() {
            return None;
        }

        let reader = self.reader.as_ref()?;
        let result = reader.lookup(ip).ok()?;
        let city = result.decode::<City>().ok()??;

        let lat = city.location.latitude?;
        let lon = city.location.longitude?;
        let position = GeoPoint::new(lat, lon)?;

        let mut place = String::new();
        if let Some(name) = city.city.names.english {
            place.push_str(name);
        }
        if let Some(iso) = city.country.iso_code {
            if !place.is_empty() {
                place.push_str(", ");
            }
            place.push_str(iso);
        }
        if place.is_empty() {
            place = "Unknown".to_string();
        }

        Some((position, place))
    }

    /// Best effort: geolocate `ip` if given, otherwise use `fallback`.
    pub fn device_location(&self, ip: Option<IpAddr>, fallback: GeoPoint) -> DeviceLocation {
        if let Some((position, label)) = ip.and_then(|ip| self.lookup(ip)) {
            info!(%label, "device located");
            return DeviceLocation {
                position,
                label,
                resolved: true,
            };
        }

        info!(
            lat = fallback.latitude(),
            lon = fallback.longitude(),
            "using default location"
        );
        DeviceLocation {
            position: fallback,
            label: "Default".to_string(),
            resolved: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GREENWICH;

    #[test]
    fn missing_database_falls_back() {
        let resolver = GeoResolver::new("/nonexistent/GeoLite2-City.mmdb");
        let ip: IpAddr = "8.8.8.8".parse().unwrap();
        assert!(resolver.lookup(ip).is_none());

        let location = resolver.device_location(Some(ip), GREENWICH);
        assert_eq!(location.position, GREENWICH);
        assert!(!location.resolved);
    }

    #[test]
    fn no_ip_falls_back() {
        let resolver = GeoResolver::new("/nonexistent/GeoLite2-City.mmdb");
        let home = GeoPoint::new(-33.9, 151.2).unwrap();
        let location = resolver.device_location(None, home);
        assert_eq!(location.position, home);
        assert_eq!(location.label, "Default");
    }

    #[test]
    fn loopback_is_never_looked_up() {
        let resolver = GeoResolver::new("/nonexistent/GeoLite2-City.mmdb");
        assert!(resolver.lookup("127.0.0.1".parse().unwrap()).is_none());
    }
}
