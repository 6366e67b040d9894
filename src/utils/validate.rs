//! Tool argument validation.
//!
//! All checks here run before any network I/O; a failing check means the
//! upstream is never contacted.

use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be at least {min} characters long")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },

    #[error("{field} must be one of: {allowed}; got '{value}'")]
    NotAllowed {
        field: &'static str,
        allowed: String,
        value: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL points at a private or loopback address")]
    PrivateHost,
}

/// Trim a required string argument and reject it when nothing is left
pub fn require_non_empty(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(value.to_string())
}

/// Like [`require_non_empty`], with a minimum length counted in characters
pub fn require_min_chars(
    field: &'static str,
    value: &str,
    min: usize,
) -> Result<String, ValidationError> {
    let value = require_non_empty(field, value)?;
    if value.chars().count() < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(value)
}

/// Reject a number outside `min..=max`
pub fn require_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(value)
}

/// Bring a result count into `min..=max` instead of rejecting it
pub fn clamp_count(value: i64, min: u32, max: u32) -> u32 {
    value.clamp(i64::from(min), i64::from(max)) as u32
}

/// Case-insensitive membership check; returns the canonical spelling from `allowed`
pub fn require_one_of(
    field: &'static str,
    value: &str,
    allowed: &[&'static str],
) -> Result<&'static str, ValidationError> {
    let value = value.trim();
    allowed
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(value))
        .copied()
        .ok_or_else(|| ValidationError::NotAllowed {
            field,
            allowed: allowed.join(", "),
            value: value.to_string(),
        })
}

/// Validate a URL that will be fetched on behalf of a client.
///
/// A missing scheme is taken to mean `https://`. Only http and https are
/// accepted, and unless `allow_private` is set, hosts matched by
/// [`is_private_host`] are refused.
pub fn validate_url(url: &str, allow_private: bool) -> Result<url::Url, ValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::Empty("url"));
    }

    if url.contains('\0') || url.contains('\n') || url.contains('\r') {
        return Err(ValidationError::InvalidUrl(
            "contains control characters".to_string(),
        ));
    }

    let candidate = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    let parsed =
        url::Url::parse(&candidate).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::InvalidUrl(format!(
                "unsupported scheme: {}",
                other
            )))
        }
    }

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ValidationError::InvalidUrl("missing host".to_string()))?;

    if !allow_private && is_private_host(host) {
        return Err(ValidationError::PrivateHost);
    }

    Ok(parsed)
}

/// Loopback, private, link-local, shared (CGNAT) and unspecified addresses,
/// plus `localhost` names. IPv4-mapped IPv6 addresses are judged as IPv4.
pub fn is_private_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']').to_lowercase();
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_private_v4(v4),
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_v4(v4),
            None => {
                let first = v6.segments()[0];
                v6.is_loopback()
                    || v6.is_unspecified()
                    || (first & 0xfe00) == 0xfc00
                    || (first & 0xffc0) == 0xfe80
            }
        },
        Err(_) => false,
    }
}

fn is_private_v4(v4: Ipv4Addr) -> bool {
    let [a, b, ..] = v4.octets();
    v4.is_loopback()
        || v4.is_private()
        || v4.is_link_local()
        || v4.is_unspecified()
        || v4.is_broadcast()
        || (a == 100 && (b & 0xc0) == 64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty() {
        assert_eq!(require_non_empty("query", "  rust  ").unwrap(), "rust");
        assert_eq!(
            require_non_empty("query", "   "),
            Err(ValidationError::Empty("query"))
        );
    }

    #[test]
    fn test_require_min_chars_counts_characters() {
        assert!(require_min_chars("fighter_name", "Ю", 2).is_err());
        assert_eq!(require_min_chars("fighter_name", "Юи", 2).unwrap(), "Юи");
    }

    #[test]
    fn test_require_range() {
        assert!(require_range("limit", 0, 1, 50).is_err());
        assert!(require_range("limit", 51, 1, 50).is_err());
        assert_eq!(require_range("limit", 50, 1, 50).unwrap(), 50);
    }

    #[test]
    fn test_clamp_count() {
        assert_eq!(clamp_count(500, 1, 50), 50);
        assert_eq!(clamp_count(-3, 1, 50), 1);
        assert_eq!(clamp_count(7, 1, 50), 7);
    }

    #[test]
    fn test_require_one_of_is_case_insensitive() {
        assert_eq!(
            require_one_of("registry_type", "docker", &["DOCKER", "DEBIAN", "RPM"]).unwrap(),
            "DOCKER"
        );
        let err = require_one_of("registry_type", "npm", &["DOCKER", "DEBIAN", "RPM"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "registry_type must be one of: DOCKER, DEBIAN, RPM; got 'npm'"
        );
    }

    #[test]
    fn test_validate_url_adds_scheme() {
        let url = validate_url("example.com/page", false).unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_validate_url_rejects_bad_input() {
        assert_eq!(validate_url("", false), Err(ValidationError::Empty("url")));
        assert!(validate_url("ftp://example.com/file", false).is_err());
        assert!(validate_url("https://exa\nmple.com", false).is_err());
    }

    #[test]
    fn test_validate_url_private_hosts() {
        assert_eq!(
            validate_url("http://127.0.0.1:8080/", false),
            Err(ValidationError::PrivateHost)
        );
        assert_eq!(
            validate_url("http://192.168.1.10/", false),
            Err(ValidationError::PrivateHost)
        );
        assert!(validate_url("http://127.0.0.1:8080/", true).is_ok());
        assert!(validate_url("https://8.8.8.8/", false).is_ok());
    }

    #[test]
    fn test_validate_url_private_ipv6_and_shared_ranges() {
        for url in [
            "http://[::ffff:127.0.0.1]:8080/",
            "http://[::ffff:10.0.0.1]/",
            "http://[fd00::1]/",
            "http://[fc00::1]/",
            "http://[fe80::1]/",
            "http://[::1]/",
            "http://100.64.0.1/",
            "http://100.127.255.254/",
            "http://api.localhost/",
        ] {
            assert_eq!(validate_url(url, false), Err(ValidationError::PrivateHost), "{}", url);
        }
        assert!(validate_url("http://[2606:4700:4700::1111]/", false).is_ok());
        assert!(validate_url("http://[::ffff:8.8.8.8]/", false).is_ok());
        assert!(validate_url("http://100.128.0.1/", false).is_ok());
    }
}
