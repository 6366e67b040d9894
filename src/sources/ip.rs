//! IP geolocation with provider fallback.
//!
//! Lookups go to ip-api.com, then ipapi.co, then ipwhois.app. When no address
//! is given, the caller's public address is discovered first through ipify,
//! httpbin and icanhazip.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::{secs, IpConfig};
use crate::gateway::{ensure_success, GatewayError, Orchestrator, SourceError, UpstreamSource};
use crate::models::{IpFlags, IpRecord};
use crate::normalize::lenient;
use crate::utils::HttpClient;

const IP_API_FIELDS: &str = "status,message,query,country,countryCode,region,regionName,city,zip,lat,lon,timezone,isp,org,as,mobile,proxy,hosting";

/// How a geolocation provider's payload is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpInfoParser {
    IpApiCom,
    IpapiCo,
    IpwhoisApp,
}

/// How a public-address echo service answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfIpParser {
    /// `{"ip": "..."}`
    Ipify,
    /// `{"origin": "..."}`
    Httpbin,
    /// The address as plain text
    PlainText,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IpApiComResponse {
    #[serde(deserialize_with = "lenient::string")]
    status: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    message: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    query: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    country: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    country_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    region: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    region_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    city: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    zip: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    lat: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    lon: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    timezone: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    isp: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    org: Option<String>,
    #[serde(rename = "as", deserialize_with = "lenient::string")]
    as_number: Option<String>,
    #[serde(deserialize_with = "lenient::boolean")]
    mobile: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    proxy: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    hosting: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IpapiCoResponse {
    error: Option<Value>,
    #[serde(deserialize_with = "lenient::string")]
    reason: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    ip: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    country_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    country_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    region: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    region_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    city: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    postal: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    longitude: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    timezone: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    org: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    asn: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IpwhoisResponse {
    #[serde(deserialize_with = "lenient::boolean")]
    success: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    message: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    ip: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    country: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    country_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    region: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    city: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    longitude: Option<f64>,
    /// A zone name, or an object carrying one under `name`
    timezone: Option<Value>,
    #[serde(deserialize_with = "lenient::string")]
    isp: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    org: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    asn: Option<String>,
}

/// Map an ip-api.com payload; `status` must be `success`
fn parse_ip_api_com(data: Value, source: &str, queried: &str) -> Result<IpRecord, SourceError> {
    let data: IpApiComResponse = serde_json::from_value(data)?;
    if data.status.as_deref() != Some("success") {
        return Err(SourceError::rejected(
            data.message.unwrap_or_else(|| "status is not success".to_string()),
        ));
    }
    Ok(IpRecord {
        ip: data.query.unwrap_or_else(|| queried.to_string()),
        country: data.country,
        country_code: data.country_code,
        region: data.region_name,
        region_code: data.region,
        city: data.city,
        zip: data.zip,
        latitude: data.lat,
        longitude: data.lon,
        timezone: data.timezone,
        isp: data.isp,
        org: data.org,
        as_number: data.as_number,
        flags: IpFlags::from_optional(data.mobile, data.proxy, data.hosting),
        source: source.to_string(),
    })
}

/// Map an ipapi.co payload; any `error` key means failure
fn parse_ipapi_co(data: Value, source: &str, queried: &str) -> Result<IpRecord, SourceError> {
    let data: IpapiCoResponse = serde_json::from_value(data)?;
    if data.error.is_some() {
        return Err(SourceError::rejected(
            data.reason.unwrap_or_else(|| "error flag set".to_string()),
        ));
    }
    Ok(IpRecord {
        ip: data.ip.unwrap_or_else(|| queried.to_string()),
        country: data.country_name,
        country_code: data.country_code,
        region: data.region,
        region_code: data.region_code,
        city: data.city,
        zip: data.postal,
        latitude: data.latitude,
        longitude: data.longitude,
        timezone: data.timezone,
        isp: data.org.clone(),
        org: data.org,
        as_number: data.asn,
        flags: IpFlags::empty(),
        source: source.to_string(),
    })
}

/// Map an ipwhois.app payload; `success` must be true
fn parse_ipwhois(data: Value, source: &str, queried: &str) -> Result<IpRecord, SourceError> {
    let data: IpwhoisResponse = serde_json::from_value(data)?;
    if data.success != Some(true) {
        return Err(SourceError::rejected(
            data.message.unwrap_or_else(|| "success is not true".to_string()),
        ));
    }
    let timezone = match data.timezone {
        Some(Value::String(zone)) => Some(zone),
        Some(Value::Object(map)) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
    .filter(|zone| !zone.is_empty());

    Ok(IpRecord {
        ip: data.ip.unwrap_or_else(|| queried.to_string()),
        country: data.country,
        country_code: data.country_code,
        region: data.region,
        region_code: None,
        city: data.city,
        zip: None,
        latitude: data.latitude,
        longitude: data.longitude,
        timezone,
        isp: data.isp,
        org: data.org,
        as_number: data.asn,
        flags: IpFlags::empty(),
        source: source.to_string(),
    })
}

/// Geolocation client
#[derive(Debug, Clone)]
pub struct IpClient {
    http: HttpClient,
    lookup: Orchestrator<IpInfoParser>,
    self_ip: Orchestrator<SelfIpParser>,
}

impl IpClient {
    pub fn new(http: HttpClient, config: &IpConfig) -> Self {
        let lookup_timeout = secs(config.lookup_timeout_secs);
        let self_timeout = secs(config.self_ip_timeout_secs);

        let lookup = vec![
            UpstreamSource::new("ip-api.com", &config.ip_api_com_url, lookup_timeout, IpInfoParser::IpApiCom),
            UpstreamSource::new("ipapi.co", &config.ipapi_co_url, lookup_timeout, IpInfoParser::IpapiCo),
            UpstreamSource::new("ipwhois.app", &config.ipwhois_url, lookup_timeout, IpInfoParser::IpwhoisApp),
        ];
        let self_ip = vec![
            UpstreamSource::new("ipify", &config.ipify_url, self_timeout, SelfIpParser::Ipify),
            UpstreamSource::new("httpbin", &config.httpbin_url, self_timeout, SelfIpParser::Httpbin),
            UpstreamSource::new("icanhazip", &config.icanhazip_url, self_timeout, SelfIpParser::PlainText),
            UpstreamSource::new("ipv4.icanhazip", &config.icanhazip_v4_url, self_timeout, SelfIpParser::PlainText),
        ];

        Self::with_sources(http, lookup, self_ip)
    }

    pub fn with_sources(
        http: HttpClient,
        lookup: Vec<UpstreamSource<IpInfoParser>>,
        self_ip: Vec<UpstreamSource<SelfIpParser>>,
    ) -> Self {
        Self {
            http,
            lookup: Orchestrator::new("ip lookup", lookup),
            self_ip: Orchestrator::new("public ip", self_ip),
        }
    }

    /// Geolocate `ip`, or the caller's own public address when `ip` is blank
    pub async fn lookup(&self, ip: &str) -> Result<IpRecord, GatewayError> {
        let ip = match ip.trim() {
            "" => self.public_ip().await.map_err(|e| {
                GatewayError::validation(format!("could not determine IP address ({})", e))
            })?,
            given => given.to_string(),
        };

        info!(ip = %ip, "Looking up IP address");
        self.lookup
            .resolve(|source| self.query_info(source, &ip))
            .await
    }

    /// Discover the caller's public address
    pub async fn public_ip(&self) -> Result<String, GatewayError> {
        self.self_ip.resolve(|source| self.query_self(source)).await
    }

    async fn query_info(
        &self,
        source: &UpstreamSource<IpInfoParser>,
        ip: &str,
    ) -> Result<IpRecord, SourceError> {
        let encoded = urlencoding::encode(ip);
        let request = match source.parser() {
            IpInfoParser::IpApiCom => self
                .http
                .get(&source.endpoint(&format!("/json/{}", encoded)))
                .query(&[("fields", IP_API_FIELDS)]),
            IpInfoParser::IpapiCo => self.http.get(&source.endpoint(&format!("/{}/json/", encoded))),
            IpInfoParser::IpwhoisApp => self.http.get(&source.endpoint(&format!("/json/{}", encoded))),
        };

        let response = ensure_success(request.timeout(source.timeout()).send().await?).await?;
        let data: Value = response.json().await?;

        match source.parser() {
            IpInfoParser::IpApiCom => parse_ip_api_com(data, source.id(), ip),
            IpInfoParser::IpapiCo => parse_ipapi_co(data, source.id(), ip),
            IpInfoParser::IpwhoisApp => parse_ipwhois(data, source.id(), ip),
        }
    }

    async fn query_self(&self, source: &UpstreamSource<SelfIpParser>) -> Result<String, SourceError> {
        let request = match source.parser() {
            SelfIpParser::Ipify => self
                .http
                .get(&source.endpoint("/"))
                .query(&[("format", "json")]),
            SelfIpParser::Httpbin => self.http.get(&source.endpoint("/ip")),
            SelfIpParser::PlainText => self.http.get(&source.endpoint("/")),
        };

        let response = ensure_success(request.timeout(source.timeout()).send().await?).await?;

        let address = match source.parser() {
            SelfIpParser::Ipify => json_field(response.json().await?, "ip"),
            SelfIpParser::Httpbin => json_field(response.json().await?, "origin")
                // httpbin lists every hop behind a proxy
                .map(|origin| origin.split(',').next().unwrap_or_default().trim().to_string()),
            SelfIpParser::PlainText => Some(response.text().await?.trim().to_string()),
        };

        address
            .filter(|a| !a.is_empty())
            .ok_or_else(|| SourceError::rejected("no address in response"))
    }
}

fn json_field(data: Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ip_api_com() {
        let record = parse_ip_api_com(
            json!({
                "status": "success",
                "query": "8.8.8.8",
                "country": "United States",
                "countryCode": "US",
                "region": "VA",
                "regionName": "Virginia",
                "city": "Ashburn",
                "zip": "20149",
                "lat": 39.03,
                "lon": -77.5,
                "timezone": "America/New_York",
                "isp": "Google LLC",
                "org": "Google Public DNS",
                "as": "AS15169 Google LLC",
                "hosting": true
            }),
            "ip-api.com",
            "8.8.8.8",
        )
        .unwrap();

        assert_eq!(record.region.as_deref(), Some("Virginia"));
        assert_eq!(record.region_code.as_deref(), Some("VA"));
        assert_eq!(record.as_number.as_deref(), Some("AS15169 Google LLC"));
        assert_eq!(record.flags, IpFlags::HOSTING);
        assert_eq!(record.source, "ip-api.com");
    }

    #[test]
    fn test_ip_api_com_failure_status_is_rejected() {
        let err = parse_ip_api_com(
            json!({"status": "fail", "message": "reserved range"}),
            "ip-api.com",
            "10.0.0.1",
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Rejected(ref m) if m == "reserved range"));
    }

    #[test]
    fn test_ipapi_co_error_key_is_rejected() {
        let err = parse_ipapi_co(
            json!({"error": true, "reason": "RateLimited"}),
            "ipapi.co",
            "1.1.1.1",
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Rejected(_)));
    }

    #[test]
    fn test_ipapi_co_uses_org_as_isp() {
        let record = parse_ipapi_co(
            json!({"ip": "1.1.1.1", "country_name": "Australia", "org": "CLOUDFLARENET", "postal": null, "latitude": "-33.49"}),
            "ipapi.co",
            "1.1.1.1",
        )
        .unwrap();
        assert_eq!(record.isp.as_deref(), Some("CLOUDFLARENET"));
        assert_eq!(record.zip, None);
        assert_eq!(record.latitude, Some(-33.49));
    }

    #[test]
    fn test_ipwhois_timezone_shapes() {
        let nested = parse_ipwhois(
            json!({"success": true, "ip": "1.1.1.1", "timezone": {"name": "Australia/Sydney"}}),
            "ipwhois.app",
            "1.1.1.1",
        )
        .unwrap();
        assert_eq!(nested.timezone.as_deref(), Some("Australia/Sydney"));

        let flat = parse_ipwhois(
            json!({"success": true, "ip": "1.1.1.1", "timezone": "Europe/Moscow"}),
            "ipwhois.app",
            "1.1.1.1",
        )
        .unwrap();
        assert_eq!(flat.timezone.as_deref(), Some("Europe/Moscow"));
    }

    #[test]
    fn test_ipwhois_without_success_is_rejected() {
        assert!(parse_ipwhois(json!({"ip": "1.1.1.1"}), "ipwhois.app", "1.1.1.1").is_err());
    }
}
