mod common;

use common::TestEnv;
use predicates::prelude::*;
use serde_json::json;
use syncsketch_dump::{
    Config, ConfigError, Credentials, RecordId, RemoteServiceError, ReviewApi, SyncSketchClient,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base_url: &str, max_pages: usize) -> Config {
    Config::from_yaml(&format!(
        "base_url: {}\n\
         ProjectUnderTest: Demo\n\
         ReviewUnderTest: Dailies\n\
         ItemUnderTest: shot_010\n\
         timeout_secs: 5\n\
         max_pages: {}\n",
        base_url, max_pages
    ))
    .expect("valid config")
}

fn listing(objects: serde_json::Value, next: Option<&str>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "meta": {"limit": 2, "offset": 0, "total_count": 3, "next": next},
        "objects": objects,
    }))
}

/// The blocking client must not be built or dropped on an async worker.
async fn with_client<T, F>(base_url: String, max_pages: usize, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(SyncSketchClient) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let creds = Credentials::new("me@example.com", "s3cret");
        let client = SyncSketchClient::new(&config(&base_url, max_pages), &creds)
            .expect("client builds");
        f(client)
    })
    .await
    .expect("blocking task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn sends_apikey_header_and_parent_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/review/"))
        .and(query_param("project__id", "42"))
        .and(query_param("active", "1"))
        .and(header("authorization", "apikey me@example.com:s3cret"))
        .respond_with(listing(json!([{"id": 7, "name": "Dailies"}]), None))
        .expect(1)
        .mount(&server)
        .await;

    let listing = with_client(server.uri(), 20, |c| c.reviews(&RecordId::from(42)))
        .await
        .expect("reviews listed");

    assert_eq!(listing.objects.len(), 1);
    assert_eq!(listing.objects[0].name(), Some("Dailies"));
}

#[tokio::test(flavor = "multi_thread")]
async fn follows_next_links_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/frame/"))
        .and(query_param("offset", "2"))
        .respond_with(listing(json!([{"id": 3, "text": "third"}]), None))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/frame/"))
        .and(query_param("item__id", "9"))
        .respond_with(listing(
            json!([{"id": 1, "text": "first"}, {"id": 2, "text": "second"}]),
            Some("/api/v1/frame/?item__id=9&limit=2&offset=2"),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let listing = with_client(server.uri(), 20, |c| c.comments(&RecordId::from(9)))
        .await
        .expect("comments listed");

    let ids: Vec<String> = listing
        .objects
        .iter()
        .filter_map(|r| r.id())
        .map(|id| id.to_string())
        .collect();
    assert_eq!(ids, ["1", "2", "3"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn max_pages_caps_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/item/"))
        .respond_with(listing(
            json!([{"id": 1, "name": "shot_010"}]),
            Some("/api/v1/item/?offset=1"),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let listing = with_client(server.uri(), 1, |c| c.items(&RecordId::from(7)))
        .await
        .expect("items listed");

    assert_eq!(listing.objects.len(), 1);
}

#[test]
fn base_url_without_paths_is_rejected_before_any_request() {
    let creds = Credentials::new("me@example.com", "s3cret");
    let err = SyncSketchClient::new(&config("mailto:reviews@example.com", 20), &creds)
        .err()
        .expect("client refused");

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidBaseUrl(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn error_status_is_a_remote_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/account/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = with_client(server.uri(), 20, |c| c.accounts())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteServiceError::Status { status: 503, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_credentials_mean_not_connected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/person/connected/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let connected = with_client(server.uri(), 20, |c| c.is_connected())
        .await
        .expect("status answered");

    assert!(!connected);
}

#[tokio::test(flavor = "multi_thread")]
async fn dumps_the_whole_tree_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/person/connected/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(path("/api/v2/account/"))
        .respond_with(listing(json!([{"id": 1, "name": "Studio"}]), None))
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/project/"))
        .and(query_param("account__id", "1"))
        .respond_with(listing(
            json!([{"id": 41, "name": "Archive"}, {"id": 42, "name": "Demo Project"}]),
            None,
        ))
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/review/"))
        .and(query_param("project__id", "42"))
        .respond_with(listing(json!([{"id": 7, "name": "Dailies 01"}]), None))
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/item/"))
        .and(query_param("reviews__id", "7"))
        .respond_with(listing(json!([{"id": 9, "name": "shot_010_v2"}]), None))
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/frame/"))
        .and(query_param("item__id", "9"))
        .respond_with(listing(json!([{"id": 100, "text": "fix the edge"}]), None))
        .mount(&server)
        .await;

    let env = TestEnv::new(&server.uri());
    let mut cmd = env.cmd();
    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .success()
            .stdout(predicate::str::starts_with(
                "\nConnected to SyncSketch? true\n\nAccount ID: 1: Studio\n",
            ))
            .stdout(predicate::str::contains(
                "\nReviews in the Project Under Test:\n\t7 Dailies 01\n",
            ))
            .stdout(predicate::str::ends_with(
                "\nComments in the Item Under Test:\n\t100 fix the edge\n\n\n",
            ));
    })
    .await
    .expect("binary run");
}

#[tokio::test(flavor = "multi_thread")]
async fn unmatched_project_keyword_lists_nothing_below_it() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/person/connected/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(path("/api/v2/account/"))
        .respond_with(listing(json!([{"id": 1, "name": "Studio"}]), None))
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/project/"))
        .respond_with(listing(json!([{"id": 41, "name": "Archive"}]), None))
        .expect(1)
        .mount(&server)
        .await;
    for endpoint in ["/api/v1/review/", "/api/v1/item/", "/api/v1/frame/"] {
        Mock::given(path(endpoint))
            .respond_with(listing(json!([{"id": 700, "name": "Dailies of project 99"}]), None))
            .expect(0)
            .mount(&server)
            .await;
    }

    let env = TestEnv::new(&server.uri());
    let mut cmd = env.cmd();
    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .success()
            .stdout(predicate::str::contains(
                "\nReviews in the Project Under Test:\n\n\n\nItems in the Review Under Test:\n\n\n",
            ))
            .stdout(predicate::str::ends_with(
                "\nComments in the Item Under Test:\n\n\n",
            ))
            .stdout(predicate::str::contains("700").not());
    })
    .await
    .expect("binary run");
}
