//! IP geolocation records.

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Connection characteristics reported by some geolocation providers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub struct IpFlags: u8 {
        const MOBILE = 0b001;
        const PROXY = 0b010;
        const HOSTING = 0b100;
    }
}

impl IpFlags {
    /// Build from the optional booleans a provider returns; absent means unset
    pub fn from_optional(mobile: Option<bool>, proxy: Option<bool>, hosting: Option<bool>) -> Self {
        let mut flags = IpFlags::empty();
        flags.set(IpFlags::MOBILE, mobile.unwrap_or(false));
        flags.set(IpFlags::PROXY, proxy.unwrap_or(false));
        flags.set(IpFlags::HOSTING, hosting.unwrap_or(false));
        flags
    }
}

/// Geolocation of one IP address, whichever provider answered
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IpRecord {
    pub ip: String,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    pub as_number: Option<String>,
    pub flags: IpFlags,
    /// Provider that produced the record
    pub source: String,
}

impl IpRecord {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}
