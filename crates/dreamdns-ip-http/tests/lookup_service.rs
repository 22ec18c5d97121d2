//! Integration tests for the HTTP resolver against a mock lookup service.

use dreamdns_core::Error;
use dreamdns_core::traits::IpResolver;
use dreamdns_ip_http::HttpIpResolver;
use std::net::IpAddr;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn resolver(server: &MockServer) -> HttpIpResolver {
    HttpIpResolver::new(format!("{}/raw", server.uri()), Duration::from_secs(1), true)
        .expect("resolver builds")
}

#[tokio::test]
async fn resolves_plain_text_answer() {
    let server = serve("203.0.113.7\n").await;

    let ip = resolver(&server).resolve().await.expect("resolves");
    assert_eq!(ip, IpAddr::from([203, 0, 113, 7]));
}

#[tokio::test]
async fn rejects_non_address_answer() {
    let server = serve("not-an-ip").await;

    let err = resolver(&server).resolve().await.unwrap_err();
    assert!(matches!(err, Error::InvalidAddress(_)));
}

#[tokio::test]
async fn error_status_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = resolver(&server).resolve().await.unwrap_err();
    assert!(matches!(err, Error::UnreachableService(_)));
}

#[tokio::test]
async fn slow_service_times_out_as_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("203.0.113.7")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = resolver(&server).resolve().await.unwrap_err();
    assert!(matches!(err, Error::UnreachableService(_)));
}

#[tokio::test]
async fn each_call_queries_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7"))
        .expect(2)
        .mount(&server)
        .await;

    let resolver = resolver(&server);
    resolver.resolve().await.expect("first lookup");
    resolver.resolve().await.expect("second lookup");
}
