use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use axum::{
    extract::Path,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Router,
};
use reqwest::Url;
use resgate::token::{self, Claims, Secret};
use resgate_server::{build_router, config::Config, AppState};
use serde_json::{json, Value};

const SECRET: &str = "my$ecretK3y";
const UPSTREAM_TOKEN: &str = "dor-token";
const DRUID: &str = "druid:bc999dg9999";
const MOVED: &str = "druid:moved";

fn book() -> Value {
    json!({
        "label": "hello",
        "externalIdentifier": DRUID,
        "version": 2,
        "type": "http://cocina.sul.stanford.edu/models/book.jsonld",
        "access": {
            "access": "world",
            "copyright": "All rights reserved unless otherwise indicated.",
            "download": "none",
            "useAndReproductionStatement": "Property rights reside with the repository...",
            "embargo": {
                "releaseDate": "2029-06-22T07:00:00.000+00:00",
                "access": "world",
                "download": "world",
                "useAndReproductionStatement": "Whatever you want"
            }
        },
        "administrative": {
            "hasAdminPolicy": "druid:bc123df4567",
            "partOfProject": "Google Books",
            "releaseTags": []
        },
        "identification": {
            "catalogLinks": [{ "catalog": "symphony", "catalogRecordId": "123456" }],
            "sourceId": "googlebooks:stanford_82323429"
        },
        "structural": {
            "isMemberOf": ["druid:fg123hj4567"],
            "contains": [{
                "type": "http://cocina.sul.stanford.edu/models/resources/file.jsonld",
                "externalIdentifier": "9999",
                "label": "Page 1",
                "structural": { "contains": [] },
                "version": 2
            }]
        }
    })
}

/// A description the upstream files under a different identifier.
fn moved() -> Value {
    let mut document = book();
    document["externalIdentifier"] = json!("druid:cd000ef0000");
    document
}

async fn spawn(app: Router) -> SocketAddr {
    let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
        .serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(async move { server.await.expect("serve app") });
    addr
}

/// Serves the book fixture and a few failure modes, keyed by identifier.
fn fake_object_service() -> Router {
    Router::new().route(
        "/v1/objects/:id",
        get(|Path(id): Path<String>, headers: HeaderMap| async move {
            let authorized = headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                == Some(format!("Bearer {UPSTREAM_TOKEN}").as_str());
            if !authorized {
                return (
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "Not Authorized" }).to_string(),
                );
            }

            match id.as_str() {
                DRUID => (StatusCode::OK, book().to_string()),
                "druid:incomplete" => (
                    StatusCode::OK,
                    json!({ "externalIdentifier": "druid:incomplete" }).to_string(),
                ),
                MOVED => (StatusCode::OK, moved().to_string()),
                "druid:html" => (StatusCode::OK, "<html>oops</html>".to_string()),
                "druid:array" => (StatusCode::OK, "[1,2,3]".to_string()),
                "druid:broken" => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "errors": [{ "title": "boom" }] }).to_string(),
                ),
                "druid:slow" => {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    (StatusCode::OK, book().to_string())
                }
                _ => (StatusCode::NOT_FOUND, String::new()),
            }
        }),
    )
}

fn config(upstream: SocketAddr, timeout: Duration) -> Config {
    Config {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        upstream_url: Url::parse(&format!("http://{upstream}")).expect("upstream url"),
        upstream_timeout: timeout,
        upstream_token: Some(UPSTREAM_TOKEN.to_string()),
        jwt_secret: SECRET.to_string(),
    }
}

async fn spawn_gateway(config: &Config) -> SocketAddr {
    spawn(build_router(AppState::new(config).expect("app state"))).await
}

/// Gateway in front of the fake object service.
async fn gateway() -> SocketAddr {
    let upstream = spawn(fake_object_service()).await;
    spawn_gateway(&config(upstream, Duration::from_secs(2))).await
}

fn jwt() -> String {
    token::issue(&Secret::new(SECRET.as_bytes()), &Claims::new("argo")).expect("issue token")
}

async fn get_resource(gateway: SocketAddr, id: &str) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .get(format!("http://{gateway}/v1/resources/{id}"))
        .header("Content-Type", "application/json")
        .bearer_auth(jwt())
        .send()
        .await
        .expect("send request");

    let status = StatusCode::from_u16(response.status().as_u16()).expect("status");
    let body = response.bytes().await.expect("read body");
    let body = serde_json::from_slice(&body).expect("gateway always answers JSON");
    (status, body)
}

#[tokio::test]
async fn returns_the_resource_description() {
    let gateway = gateway().await;

    let (status, body) = get_resource(gateway, DRUID).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["externalIdentifier"], DRUID);
    assert_eq!(body["structural"]["contains"][0]["label"], "Page 1");
}

#[tokio::test]
async fn pass_through_is_lossless() {
    let gateway = gateway().await;

    let (_, body) = get_resource(gateway, DRUID).await;

    assert_eq!(body, book());
}

#[tokio::test]
async fn incomplete_descriptions_are_passed_through() {
    let gateway = gateway().await;

    let (status, body) = get_resource(gateway, "druid:incomplete").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "externalIdentifier": "druid:incomplete" }));
}

#[tokio::test]
async fn unknown_identifier_is_not_found() {
    let gateway = gateway().await;

    let (status, body) = get_resource(gateway, "druid:zz000zz0000").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "NOT_FOUND");
}

#[tokio::test]
async fn non_json_upstream_body_is_malformed() {
    let gateway = gateway().await;

    for id in ["druid:html", "druid:array"] {
        let (status, body) = get_resource(gateway, id).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY, "{id}");
        assert_eq!(body["status"], "DOWNSTREAM_MALFORMED", "{id}");
    }
}

#[tokio::test]
async fn upstream_error_status_is_passed_through() {
    let gateway = gateway().await;

    let (status, body) = get_resource(gateway, "druid:broken").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "UPSTREAM_ERROR");
    assert_eq!(body["details"]["errors"][0]["title"], "boom");
}

#[tokio::test]
async fn unreachable_upstream_is_unavailable() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind listener")
        .local_addr()
        .expect("local addr");
    let gateway = spawn_gateway(&config(closed, Duration::from_secs(2))).await;

    let (status, body) = get_resource(gateway, DRUID).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let upstream = spawn(fake_object_service()).await;
    let gateway = spawn_gateway(&config(upstream, Duration::from_millis(200))).await;

    let started = Instant::now();
    let (status, body) = get_resource(gateway, "druid:slow").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "UPSTREAM_UNAVAILABLE");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn requests_without_a_valid_token_are_rejected() {
    let gateway = gateway().await;
    let client = reqwest::Client::new();
    let url = format!("http://{gateway}/v1/resources/{DRUID}");

    let missing = client.get(&url).send().await.expect("send request");
    assert_eq!(missing.status().as_u16(), 401);

    let forged = token::issue(&Secret::new(b"not-the-secret"), &Claims::new("argo"))
        .expect("issue token");
    let invalid = client
        .get(&url)
        .bearer_auth(forged)
        .send()
        .await
        .expect("send request");
    assert_eq!(invalid.status().as_u16(), 401);

    let body: Value = serde_json::from_slice(&invalid.bytes().await.expect("read body"))
        .expect("json body");
    assert_eq!(body["status"], "UNAUTHORIZED");
}

#[tokio::test]
async fn status_needs_no_token() {
    let gateway = gateway().await;

    let response = reqwest::get(format!("http://{gateway}/status"))
        .await
        .expect("send request");

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn mismatched_external_identifier_is_passed_through_unchanged() {
    let gateway = gateway().await;

    let response = reqwest::Client::new()
        .get(format!("http://{gateway}/v1/resources/{MOVED}"))
        .bearer_auth(jwt())
        .send()
        .await
        .expect("send request");

    assert_eq!(response.status().as_u16(), 200);
    let body = response.bytes().await.expect("read body");
    assert_eq!(&body[..], moved().to_string().as_bytes());
}

#[tokio::test]
async fn upstream_rejecting_gateway_credentials_is_a_bad_gateway() {
    let upstream = spawn(fake_object_service()).await;
    let mut config = config(upstream, Duration::from_secs(2));
    config.upstream_token = Some("not-the-dor-token".to_string());
    let gateway = spawn_gateway(&config).await;

    let response = reqwest::Client::new()
        .get(format!("http://{gateway}/v1/resources/{DRUID}"))
        .bearer_auth(jwt())
        .send()
        .await
        .expect("send request");

    assert_eq!(response.status().as_u16(), 502);
    assert!(response.headers().get("www-authenticate").is_none());

    let body: Value = serde_json::from_slice(&response.bytes().await.expect("read body"))
        .expect("json body");
    assert_eq!(body["status"], "UPSTREAM_ERROR");
    assert_eq!(body["details"]["error"], "Not Authorized");
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() {
    let gateway = gateway().await;

    let response = reqwest::Client::new()
        .get(format!("http://{gateway}/v1/resources/{DRUID}"))
        .header("Authorization", format!("bearer {}", jwt()))
        .send()
        .await
        .expect("send request");

    assert_eq!(response.status().as_u16(), 200);
}
