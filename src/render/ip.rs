//! IP geolocation.

use std::fmt::Write as _;

use crate::models::{or_unknown, IpFlags, IpRecord, UNKNOWN};

fn with_code(name: &Option<String>, code: &Option<String>) -> String {
    match code {
        Some(code) => format!("{} ({})", or_unknown(name), code),
        None => or_unknown(name).to_string(),
    }
}

fn coordinates(record: &IpRecord) -> String {
    record
        .coordinates()
        .map(|(lat, lon)| format!("{:.4}, {:.4}", lat, lon))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn flag_names(flags: IpFlags) -> Vec<&'static str> {
    let mut names = Vec::new();
    if flags.contains(IpFlags::MOBILE) {
        names.push("mobile");
    }
    if flags.contains(IpFlags::PROXY) {
        names.push("proxy/VPN");
    }
    if flags.contains(IpFlags::HOSTING) {
        names.push("hosting");
    }
    names
}

/// Location and network owner of an address
pub fn summary(record: &IpRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "IP address: {}", record.ip);
    let _ = writeln!(out);
    let _ = writeln!(out, "Country: {}", with_code(&record.country, &record.country_code));
    let _ = writeln!(out, "Region: {}", or_unknown(&record.region));
    let _ = writeln!(out, "City: {}", or_unknown(&record.city));
    let _ = writeln!(out, "Coordinates: {}", coordinates(record));
    let _ = writeln!(out, "Timezone: {}", or_unknown(&record.timezone));
    let _ = writeln!(out, "Provider: {}", or_unknown(&record.isp));

    let flags = flag_names(record.flags);
    if !flags.is_empty() {
        let _ = writeln!(out, "Flags: {}", flags.join(", "));
    }
    let _ = write!(out, "\nSource: {}", record.source);
    out
}

/// Every field of the record, including codes and AS number
pub fn detailed(record: &IpRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Detailed information for {}", record.ip);
    let _ = writeln!(out, "Source: {}", record.source);
    let _ = writeln!(out);
    let _ = writeln!(out, "Location");
    let _ = writeln!(out, "  Country: {}", or_unknown(&record.country));
    let _ = writeln!(out, "  Country code: {}", or_unknown(&record.country_code));
    let _ = writeln!(out, "  Region: {}", or_unknown(&record.region));
    let _ = writeln!(out, "  Region code: {}", or_unknown(&record.region_code));
    let _ = writeln!(out, "  City: {}", or_unknown(&record.city));
    let _ = writeln!(out, "  Postal code: {}", or_unknown(&record.zip));
    let _ = writeln!(out, "  Coordinates: {}", coordinates(record));
    let _ = writeln!(out, "  Timezone: {}", or_unknown(&record.timezone));
    let _ = writeln!(out);
    let _ = writeln!(out, "Network");
    let _ = writeln!(out, "  ISP: {}", or_unknown(&record.isp));
    let _ = writeln!(out, "  Organization: {}", or_unknown(&record.org));
    let _ = writeln!(out, "  AS: {}", or_unknown(&record.as_number));

    let flags = flag_names(record.flags);
    let connection = if flags.is_empty() {
        "regular".to_string()
    } else {
        flags.join(", ")
    };
    let _ = write!(out, "  Connection type: {}", connection);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> IpRecord {
        IpRecord {
            ip: "8.8.8.8".into(),
            country: Some("United States".into()),
            country_code: Some("US".into()),
            city: Some("Ashburn".into()),
            latitude: Some(39.03),
            longitude: Some(-77.5),
            flags: IpFlags::HOSTING | IpFlags::PROXY,
            source: "ip-api.com".into(),
            ..IpRecord::default()
        }
    }

    #[test]
    fn test_summary() {
        let text = summary(&record());
        assert!(text.contains("Country: United States (US)"));
        assert!(text.contains("Region: unknown"));
        assert!(text.contains("Coordinates: 39.0300, -77.5000"));
        assert!(text.contains("Flags: proxy/VPN, hosting"));
        assert!(text.ends_with("Source: ip-api.com"));
    }

    #[test]
    fn test_detailed_regular_connection() {
        let text = detailed(&IpRecord {
            flags: IpFlags::empty(),
            ..record()
        });
        assert!(text.contains("Postal code: unknown"));
        assert!(text.ends_with("Connection type: regular"));
    }
}
