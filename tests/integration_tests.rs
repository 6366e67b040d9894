//! Integration tests for MCP Gateways
//!
//! Every tool is driven through its [`ToolRegistry`] against mockito
//! upstreams, so argument validation, source fallback and rendering are
//! exercised together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcp_gateways::config::{Config, RegistryConfig, YandexConfig, YandexCredentials};
use mcp_gateways::gateway::{Authenticator, GatewayError, TokenManager};
use mcp_gateways::mcp::handlers::{registry, yandex};
use mcp_gateways::mcp::{tools_for, Domain, McpServer, ToolRegistry};
use mcp_gateways::sources::{ArtifactRegistryClient, YandexSearchClient};
use mcp_gateways::utils::HttpClient;
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

fn http() -> HttpClient {
    HttpClient::new(Duration::from_secs(5)).unwrap()
}

fn ip_config(server: &Server) -> Config {
    let mut config = Config::default();
    let base = server.url();
    config.ip.ip_api_com_url = format!("{}/ip-api", base);
    config.ip.ipapi_co_url = format!("{}/ipapi", base);
    config.ip.ipwhois_url = format!("{}/ipwhois", base);
    config.ip.ipify_url = format!("{}/ipify", base);
    config.ip.httpbin_url = format!("{}/httpbin", base);
    config.ip.icanhazip_url = format!("{}/icanhazip", base);
    config.ip.icanhazip_v4_url = format!("{}/icanhazip4", base);
    config.ip.lookup_timeout_secs = 5;
    config.ip.self_ip_timeout_secs = 5;
    config
}

fn text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => panic!("expected rendered text, got {}", other),
    }
}

#[tokio::test]
async fn test_ip_lookup_first_source_wins() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/ip-api/json/8.8.8.8")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "success", "query": "8.8.8.8", "country": "United States", "city": "Ashburn"}"#)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/ipapi/8.8.8.8/json/")
        .expect(0)
        .create_async()
        .await;

    let tools = tools_for(Domain::Ip, &ip_config(&server)).unwrap();
    let out = text(assert_ok!(
        tools
            .execute("ip_address_query", json!({"ip": "8.8.8.8"}))
            .await
    ));

    first.assert_async().await;
    second.assert_async().await;
    assert!(out.contains("City: Ashburn"));
    assert!(out.ends_with("Source: ip-api.com"));
}

#[tokio::test]
async fn test_ip_lookup_falls_back_to_second_source() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/ip-api/json/1.1.1.1")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/ipapi/1.1.1.1/json/")
        .with_header("content-type", "application/json")
        .with_body(r#"{"ip": "1.1.1.1", "country_name": "Australia", "org": "CLOUDFLARENET"}"#)
        .expect(1)
        .create_async()
        .await;
    let third = server
        .mock("GET", "/ipwhois/json/1.1.1.1")
        .expect(0)
        .create_async()
        .await;

    let tools = tools_for(Domain::Ip, &ip_config(&server)).unwrap();
    let out = text(
        tools
            .execute("ip_address_query", json!({"ip": "1.1.1.1"}))
            .await
            .unwrap(),
    );

    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
    assert!(out.contains("Country: Australia"));
    assert!(out.contains("Provider: CLOUDFLARENET"));
    assert!(out.ends_with("Source: ipapi.co"));
}

#[tokio::test]
async fn test_ip_lookup_all_sources_fail() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ip-api/json/9.9.9.9")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    server
        .mock("GET", "/ipapi/9.9.9.9/json/")
        .with_status(429)
        .create_async()
        .await;
    server
        .mock("GET", "/ipwhois/json/9.9.9.9")
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "message": "invalid"}"#)
        .create_async()
        .await;

    let tools = tools_for(Domain::Ip, &ip_config(&server)).unwrap();
    let err = tools
        .execute("ip_address_query_detailed", json!({"ip": "9.9.9.9"}))
        .await
        .unwrap_err();

    match err {
        GatewayError::AllSourcesUnavailable { domain, attempts } => {
            assert_eq!(domain, "ip lookup");
            let ids: Vec<&str> = attempts.iter().map(|a| a.source_id.as_str()).collect();
            assert_eq!(ids, ["ip-api.com", "ipapi.co", "ipwhois.app"]);
        }
        other => panic!("expected AllSourcesUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_own_ip_is_discovered_before_lookup() {
    let mut server = Server::new_async().await;
    let ipify = server
        .mock("GET", "/ipify/")
        .match_query(Matcher::UrlEncoded("format".into(), "json".into()))
        .with_header("content-type", "application/json")
        .with_body(r#"{"ip": "203.0.113.7"}"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/ip-api/json/203.0.113.7")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "success", "query": "203.0.113.7", "country": "Testland"}"#)
        .create_async()
        .await;

    let tools = tools_for(Domain::Ip, &ip_config(&server)).unwrap();
    let out = text(tools.execute("ip_address_query", json!({})).await.unwrap());

    ipify.assert_async().await;
    assert!(out.starts_with("IP address: 203.0.113.7"));
}

/// Hands out `tok-1`, `tok-2`, ... and counts the exchanges
#[derive(Debug, Default)]
struct CountingAuthenticator {
    issued: AtomicUsize,
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    async fn authenticate(&self) -> Result<String, GatewayError> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("tok-{}", n))
    }
}

fn registry_tools(server: &Server, auth: Arc<CountingAuthenticator>) -> ToolRegistry {
    let config = RegistryConfig {
        api_url: server.url(),
        timeout_secs: 5,
        ..RegistryConfig::default()
    };
    let client = ArtifactRegistryClient::with_token_manager(
        http(),
        &config,
        "proj-1",
        TokenManager::new("artifact registry", auth),
    );
    registry::tools(Arc::new(client)).into_iter().collect()
}

#[tokio::test]
async fn test_registry_refreshes_token_once_on_401() {
    let mut server = Server::new_async().await;
    let stale = server
        .mock("GET", "/v1/projects/proj-1/registries")
        .match_query(Matcher::UrlEncoded("pageSize".into(), "10".into()))
        .match_header("authorization", "Bearer tok-1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let fresh = server
        .mock("GET", "/v1/projects/proj-1/registries")
        .match_query(Matcher::UrlEncoded("pageSize".into(), "10".into()))
        .match_header("authorization", "Bearer tok-2")
        .with_header("content-type", "application/json")
        .with_body(r#"{"registries": [{"id": "r1", "name": "images"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let auth = Arc::new(CountingAuthenticator::default());
    let tools = registry_tools(&server, auth.clone());
    let out = tools.execute("list_registries", Value::Null).await.unwrap();

    stale.assert_async().await;
    fresh.assert_async().await;
    assert_eq!(auth.issued.load(Ordering::SeqCst), 2);
    assert_eq!(out["registries"][0]["name"], "images");
}

#[tokio::test]
async fn test_registry_second_401_is_auth_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/projects/proj-1/registries/r1")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;

    let auth = Arc::new(CountingAuthenticator::default());
    let tools = registry_tools(&server, auth.clone());
    let err = tools
        .execute("get_registry", json!({"registry_id": "r1"}))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, GatewayError::Auth(_)));
    assert_eq!(auth.issued.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_registry_create_validates_type_before_any_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let auth = Arc::new(CountingAuthenticator::default());
    let tools = registry_tools(&server, auth.clone());
    let err = tools
        .execute("create_registry", json!({"name": "pkgs", "registry_type": "helm"}))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, GatewayError::Validation(_)));
    assert_eq!(auth.issued.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_registry_create_sends_defaults() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/projects/proj-1/registries")
        .match_body(Matcher::Json(
            json!({"name": "pkgs", "registryType": "DOCKER", "isPublic": false}),
        ))
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "op-1", "done": false}"#)
        .expect(1)
        .create_async()
        .await;

    let tools = registry_tools(&server, Arc::new(CountingAuthenticator::default()));
    let out = tools
        .execute("create_registry", json!({"name": "pkgs"}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(out["id"], "op-1");
}

#[tokio::test]
async fn test_yandex_page_size_is_clamped_upstream() {
    use base64::Engine as _;

    let xml = "<yandexsearch><response><results><grouping><group><doc><url>https://www.rust-lang.org/</url><title>Rust</title></doc></group></grouping></results></response></yandexsearch>";
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/web/search")
        .match_body(Matcher::PartialJson(json!({"groupSpec": {"groupsOnPage": 50}})))
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "rawData": base64::engine::general_purpose::STANDARD.encode(xml) }).to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = YandexSearchClient::new(
        http(),
        &YandexConfig {
            search_url: format!("{}/v2/web/search", server.url()),
            timeout_secs: 5,
        },
        YandexCredentials {
            api_key: "key".into(),
            folder_id: "folder".into(),
            verify_ssl: true,
        },
    );
    let tools: ToolRegistry = yandex::tools(Arc::new(client)).into_iter().collect();
    let out = text(
        tools
            .execute("search_web", json!({"query": "rust", "page_size": 500}))
            .await
            .unwrap(),
    );

    mock.assert_async().await;
    assert!(out.contains("https://www.rust-lang.org/"));
}

#[tokio::test]
async fn test_empty_queries_never_reach_upstream() {
    let mut server = Server::new_async().await;
    let gets = server.mock("GET", Matcher::Any).expect(0).create_async().await;
    let posts = server.mock("POST", Matcher::Any).expect(0).create_async().await;

    let mut config = Config::default();
    config.search.html_url = server.url();
    config.search.lite_url = server.url();
    config.search.api_url = server.url();
    config.wikipedia.site_url = server.url();
    config.weather.geocoding_url = server.url();
    config.weather.forecast_url = server.url();

    let calls = [
        (Domain::Search, "search_web", json!({"query": "   "})),
        (Domain::Search, "search_news", json!({})),
        (Domain::Search, "search_images", json!({"query": ""})),
        (Domain::Search, "search_videos", json!({"query": "\t"})),
        (Domain::Wikipedia, "search_wikipedia", json!({"query": ""})),
        (Domain::Wikipedia, "get_wikipedia_summary", json!({"title": " "})),
        (Domain::Weather, "get_today_weather", json!({"city": ""})),
    ];
    for (domain, tool, args) in calls {
        let tools = tools_for(domain, &config).unwrap();
        let err = tools.execute(tool, args).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)), "{}: {:?}", tool, err);
    }

    let client = YandexSearchClient::new(
        http(),
        &YandexConfig {
            search_url: server.url(),
            timeout_secs: 5,
        },
        YandexCredentials {
            api_key: "key".into(),
            folder_id: "folder".into(),
            verify_ssl: true,
        },
    );
    let tools: ToolRegistry = yandex::tools(Arc::new(client)).into_iter().collect();
    let err = tools
        .execute("search_web", json!({"query": "  "}))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)), "{:?}", err);

    gets.assert_async().await;
    posts.assert_async().await;
}

#[tokio::test]
async fn test_wikipedia_argument_ranges() {
    let tools = tools_for(Domain::Wikipedia, &Config::default()).unwrap();

    let err = tools
        .execute("search_wikipedia", json!({"query": "rust", "limit": 0}))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid parameters: limit must be between 1 and 50, got 0"
    );

    let err = tools
        .execute("get_wikipedia_content", json!({"title": "Rust", "language": "xx"}))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));
}

#[tokio::test]
async fn test_search_time_limit_is_validated() {
    let tools = tools_for(Domain::Search, &Config::default()).unwrap();
    let err = assert_err!(
        tools
            .execute("search_news", json!({"query": "rust", "time_limit": "decade"}))
            .await
    );
    assert!(matches!(err, GatewayError::Validation(_)));
}

#[tokio::test]
async fn test_fetch_page_extracts_text() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/page")
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body("<html><head><title>T</title></head><body><script>x</script><p>Hello   world</p></body></html>")
        .create_async()
        .await;

    let mut config = Config::default();
    config.fetch.allow_private_hosts = true;
    let tools = tools_for(Domain::Fetch, &config).unwrap();
    let out = text(assert_ok!(
        tools
            .execute("fetch_page", json!({"url": format!("{}/page", server.url()), "timeout": 5}))
            .await
    ));

    assert!(out.contains("Title: T"));
    assert!(out.contains("Hello world"));
    assert!(!out.contains("<script>"));
}

#[tokio::test]
async fn test_fetch_page_rejects_private_hosts_and_bad_timeouts() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;
    let tools = tools_for(Domain::Fetch, &Config::default()).unwrap();

    let err = tools
        .execute("fetch_page", json!({"url": format!("{}/page", server.url())}))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));

    let err = tools
        .execute("fetch_page", json!({"url": "example.com", "timeout": 500}))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_ufc_search_fight_results_needs_a_name() {
    let tools = tools_for(Domain::Ufc, &Config::default()).unwrap();
    let err = tools
        .execute("search_fight_results", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));

    let err = tools
        .execute("search_fighter", json!({"fighter_name": "J"}))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));
}

#[tokio::test]
async fn test_unknown_tool_is_validation_error() {
    let tools = tools_for(Domain::Weather, &Config::default()).unwrap();
    let err = tools.execute("get_monthly_forecast", json!({})).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid parameters: Tool 'get_monthly_forecast' not found");
}

#[tokio::test]
async fn test_mcp_server_builds_for_each_public_domain() {
    let config = Config::default();
    for domain in [
        Domain::Weather,
        Domain::Fetch,
        Domain::Ip,
        Domain::Ufc,
        Domain::Search,
        Domain::Wikipedia,
    ] {
        let tools = tools_for(domain, &config).unwrap();
        let server = McpServer::new(tools, domain.server_name()).unwrap();
        assert_eq!(server.name(), format!("{}-mcp", domain));
    }
}
