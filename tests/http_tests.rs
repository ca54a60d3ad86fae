//! HTTP transport and discovery against mock servers.

use oidc_device_login::auth::{
    DeviceFlow, FlowOutcome, HttpDiscovery, HttpTransport, IssuerDiscovery, OAuthTransport,
    TransportError,
};
use oidc_device_login::cli::login::run_login;
use oidc_device_login::config::LoginConfig;
use oidc_device_login::error::LoginError;
use reqwest::Url;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn discovery_document(server: &MockServer) -> serde_json::Value {
    json!({
        "issuer": format!("{}/", server.uri()),
        "authorization_endpoint": format!("{}/authorize", server.uri()),
        "token_endpoint": format!("{}/oauth/token", server.uri()),
        "device_authorization_endpoint": format!("{}/oauth/device/code", server.uri()),
        "jwks_uri": format!("{}/.well-known/jwks.json", server.uri())
    })
}

fn issuer(server: &MockServer) -> Url {
    Url::parse(&server.uri()).expect("server url")
}

#[tokio::test]
async fn discovery_reads_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document(&server)))
        .expect(1)
        .mount(&server)
        .await;

    let metadata = HttpDiscovery::new()
        .discover(&issuer(&server))
        .await
        .expect("discover");

    assert_eq!(metadata.token_endpoint, format!("{}/oauth/token", server.uri()));
    assert_eq!(
        metadata.device_authorization_endpoint,
        format!("{}/oauth/device/code", server.uri())
    );
}

#[tokio::test]
async fn discovery_not_found_is_a_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = HttpDiscovery::new()
        .discover(&issuer(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::Discovery { .. }));
}

#[tokio::test]
async fn discovery_without_device_endpoint_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": server.uri(),
            "token_endpoint": format!("{}/oauth/token", server.uri())
        })))
        .mount(&server)
        .await;

    let err = HttpDiscovery::new()
        .discover(&issuer(&server))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("device_authorization_endpoint"));
}

#[tokio::test]
async fn transport_posts_json_and_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"client_id": "abc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = HttpTransport::new()
        .post_json(&format!("{}/oauth/token", server.uri()), &json!({"client_id": "abc"}))
        .await
        .expect("post");
    assert_eq!(reply, json!({"access_token": "t"}));
}

#[tokio::test]
async fn transport_maps_oauth_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "authorization_pending",
            "error_description": "User has yet to authorize device code."
        })))
        .mount(&server)
        .await;

    let err = HttpTransport::new()
        .post_json(&format!("{}/oauth/token", server.uri()), &json!({}))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Protocol {
            error: "authorization_pending".to_string(),
            description: Some("User has yet to authorize device code.".to_string()),
        }
    );
}

#[tokio::test]
async fn transport_treats_error_body_on_success_status_as_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "slow_down",
            "error_description": "Polling too fast."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = HttpTransport::new()
        .post_json(&format!("{}/oauth/token", server.uri()), &json!({}))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Protocol {
            error: "slow_down".to_string(),
            description: Some("Polling too fast.".to_string()),
        }
    );
}

#[tokio::test]
async fn transport_maps_unparseable_failure_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = HttpTransport::new()
        .post_json(&format!("{}/oauth/token", server.uri()), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 502, ref body } if body.contains("Bad Gateway")));
}

#[tokio::test]
async fn transport_connection_failure_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}/oauth/token", listener.local_addr().expect("addr"));
    drop(listener);

    let err = HttpTransport::new()
        .post_json(&url, &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}

#[tokio::test]
async fn full_login_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document(&server)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/device/code"))
        .and(body_json(json!({
            "client_id": "client-123",
            "scope": "openid offline_access",
            "audience": "https://api.example.com",
            "max_age": 300,
            "prompt": "consent"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "dev-1",
            "user_code": "WXYZ-1234",
            "verification_uri": format!("{}/activate", server.uri()),
            "verification_uri_complete": format!("{}/activate?user_code=WXYZ-1234", server.uri()),
            "expires_in": 900,
            "interval": 5
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_json(json!({
            "grant_type": "urn:ietf:params:oauth:grant-type:device_code",
            "client_id": "client-123",
            "device_code": "dev-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "eyJ.access",
            "id_token": "eyJ.id",
            "token_type": "Bearer",
            "expires_in": 86400
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = LoginConfig::builder()
        .issuer(issuer(&server))
        .client_id("client-123")
        .scope("openid offline_access")
        .audience("https://api.example.com")
        .build();
    let flow = DeviceFlow::new(HttpTransport::new());

    let outcome = run_login(&config, &HttpDiscovery::new(), &flow)
        .await
        .expect("login");

    match outcome {
        FlowOutcome::Authorized(tokens) => {
            assert_eq!(tokens.access_token, "eyJ.access");
            assert_eq!(tokens.id_token.as_deref(), Some("eyJ.id"));
        }
        other => panic!("expected authorized, got {other:?}"),
    }
}

#[tokio::test]
async fn full_login_reports_denial() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document(&server)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/device/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "dev-1",
            "user_code": "WXYZ-1234",
            "verification_uri": format!("{}/activate", server.uri()),
            "expires_in": 900
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "access_denied",
            "error_description": "User cancelled the confirmation prompt or consent page."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = LoginConfig::builder()
        .issuer(issuer(&server))
        .client_id("client-123")
        .scope("openid")
        .audience("aud")
        .build();

    let outcome = run_login(&config, &HttpDiscovery::new(), &DeviceFlow::new(HttpTransport::new()))
        .await
        .expect("login");
    assert_eq!(outcome, FlowOutcome::Denied);
}
