use httpmock::{Method::GET, MockServer};
use repo_metrics::{Config, ManifestStatus, MetricsClient};

const REPO_URL: &str = "https://github.com/o/r";

fn client_for(server: &MockServer) -> MetricsClient {
    let cfg = Config {
        api_url: server.base_url(),
        graphql_url: format!("{}/graphql", server.base_url()),
        raw_url: format!("{}/raw", server.base_url()),
        ..Config::new("t")
    };
    MetricsClient::new(cfg).unwrap()
}

fn repo_body(default_branch: &str) -> serde_json::Value {
    serde_json::json!({
        "id": 1,
        "full_name": "o/r",
        "default_branch": default_branch,
        "description": "a repo",
        "stargazers_count": 12,
        "forks_count": 3,
        "open_issues_count": 4,
        "watchers_count": 12,
        "archived": false,
        "fork": false,
        "license": {"key": "mit", "spdx_id": "MIT"}
    })
}

#[tokio::test]
async fn default_branch_from_repository_info() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/o/r")
                .header("authorization", "Bearer t");
            then.status(200)
                .header("x-ratelimit-remaining", "4999")
                .json_body(repo_body("main"));
        })
        .await;
    let client = client_for(&server);
    assert_eq!(client.default_branch_name(REPO_URL).await.unwrap(), "main");
    m.assert_async().await;
}

#[tokio::test]
async fn default_branch_as_last_field() {
    // The scraped-substring approach could not handle this shape.
    let server = MockServer::start_async().await;
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/o/r");
            then.status(200)
                .body(r#"{"full_name":"o/r","default_branch":"trunk"}"#);
        })
        .await;
    let client = client_for(&server);
    assert_eq!(client.default_branch_name(REPO_URL).await.unwrap(), "trunk");
}

#[tokio::test]
async fn repository_info_is_parsed() {
    let server = MockServer::start_async().await;
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/o/r");
            then.status(200).json_body(repo_body("main"));
        })
        .await;
    let info = client_for(&server).get_repository(REPO_URL).await.unwrap();
    assert_eq!(info.full_name, "o/r");
    assert_eq!(info.stargazers_count, 12);
    assert_eq!(info.license.and_then(|l| l.spdx_id).as_deref(), Some("MIT"));
}

#[tokio::test]
async fn missing_repository_is_a_status_error() {
    let server = MockServer::start_async().await;
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/o/r");
            then.status(404)
                .json_body(serde_json::json!({"message": "Not Found"}));
        })
        .await;
    let err = client_for(&server)
        .default_branch_name(REPO_URL)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
    assert!(!err.retriable());
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let cfg = Config {
        api_url: "http://127.0.0.1:1".into(),
        timeout_secs: 5,
        ..Config::new("t")
    };
    let client = MetricsClient::new(cfg).unwrap();
    let err = client.get_repository(REPO_URL).await.unwrap_err();
    assert_eq!(err.code(), "upstream_error");
    assert!(err.retriable());
}

#[tokio::test]
async fn contributors_are_parsed() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/o/r/contributors");
            then.status(200).json_body(serde_json::json!([
                {"login": "alice", "contributions": 40, "type": "User"},
                {"login": "dependabot[bot]", "contributions": 2, "type": "Bot"}
            ]));
        })
        .await;
    let contributors = client_for(&server).list_contributors(REPO_URL).await.unwrap();
    assert_eq!(contributors.len(), 2);
    assert_eq!(contributors[0].login, "alice");
    assert_eq!(contributors[0].contributions, 40);
    assert_eq!(contributors[1].kind.as_deref(), Some("Bot"));
    m.assert_async().await;
}

#[tokio::test]
async fn empty_repository_has_no_contributors() {
    let server = MockServer::start_async().await;
    let _m = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/o/r/contributors");
            then.status(204);
        })
        .await;
    let contributors = client_for(&server).list_contributors(REPO_URL).await.unwrap();
    assert!(contributors.is_empty());
}

#[tokio::test]
async fn closed_pull_requests_then_detail() {
    let server = MockServer::start_async().await;
    let pr_url = format!("{}/repos/o/r/pulls/7", server.base_url());
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/o/r/pulls")
                .query_param("state", "closed");
            then.status(200).json_body(serde_json::json!([
                {"number": 7, "url": pr_url, "state": "closed", "title": "Fix",
                 "user": {"login": "alice"}, "created_at": "2024-01-01T00:00:00Z",
                 "closed_at": "2024-01-02T00:00:00Z", "merged_at": "2024-01-02T00:00:00Z"},
                {"number": 6, "url": format!("{}/repos/o/r/pulls/6", server.base_url()),
                 "state": "closed", "title": "Abandoned", "merged_at": null}
            ]));
        })
        .await;
    let detail = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/o/r/pulls/7");
            then.status(200).json_body(serde_json::json!({
                "number": 7, "state": "closed", "title": "Fix", "merged": true,
                "merged_at": "2024-01-02T00:00:00Z", "comments": 1, "review_comments": 2,
                "commits": 3, "additions": 10, "deletions": 4, "changed_files": 2
            }));
        })
        .await;

    let client = client_for(&server);
    let prs = client.list_closed_pull_requests(REPO_URL).await.unwrap();
    assert_eq!(prs.len(), 2);
    assert!(prs[0].merged_at.is_some());
    assert!(prs[1].merged_at.is_none());

    let pr = client.get_pull_request(&prs[0].url).await.unwrap();
    assert!(pr.merged);
    assert_eq!(pr.review_comments, 2);
    assert_eq!(pr.changed_files, 2);
    list.assert_async().await;
    detail.assert_async().await;
}

async fn mock_repo_and_manifest(server: &MockServer, status: u16, manifest: &str) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/o/r");
            then.status(200).json_body(repo_body("main"));
        })
        .await;
    let manifest = manifest.to_string();
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/raw/o/r/main/package.json");
            then.status(status).body(manifest);
        })
        .await;
}

#[tokio::test]
async fn pinning_mixed_manifest() {
    let server = MockServer::start_async().await;
    mock_repo_and_manifest(
        &server,
        200,
        r#"{"name":"x","dependencies":{"a":"1.2.3","b":"^2.0.0","c":"4"}}"#,
    )
    .await;
    let report = client_for(&server).version_pinning(REPO_URL).await.unwrap();
    assert_eq!(report.manifest, ManifestStatus::Parsed);
    assert_eq!((report.pinned, report.total), (2, 3));
    assert!((report.ratio - 2.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn pinning_keeps_entries_with_mistyped_versions() {
    let server = MockServer::start_async().await;
    mock_repo_and_manifest(
        &server,
        200,
        r#"{"dependencies":{"a":"1.2.3","b":"^2.0.0","c":null}}"#,
    )
    .await;
    let report = client_for(&server).version_pinning(REPO_URL).await.unwrap();
    assert_eq!(report.manifest, ManifestStatus::Parsed);
    assert_eq!((report.pinned, report.total), (1, 3));
    assert!((report.ratio - 1.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn pinning_non_object_dependencies_is_unreadable() {
    let server = MockServer::start_async().await;
    mock_repo_and_manifest(&server, 200, r#"{"dependencies":["a","b"]}"#).await;
    let report = client_for(&server).version_pinning(REPO_URL).await.unwrap();
    assert_eq!(report.ratio, 1.0);
    assert_eq!(report.manifest, ManifestStatus::Unreadable);
}

#[tokio::test]
async fn pinning_without_dependencies_is_one() {
    let server = MockServer::start_async().await;
    mock_repo_and_manifest(&server, 200, r#"{"name":"x","devDependencies":{"a":"^1"}}"#).await;
    let report = client_for(&server).version_pinning(REPO_URL).await.unwrap();
    assert_eq!(report.ratio, 1.0);
    assert_eq!(report.manifest, ManifestStatus::Parsed);
}

#[tokio::test]
async fn pinning_missing_manifest_is_distinguishable() {
    let server = MockServer::start_async().await;
    mock_repo_and_manifest(&server, 404, "404: Not Found").await;
    let report = client_for(&server).version_pinning(REPO_URL).await.unwrap();
    assert_eq!(report.ratio, 1.0);
    assert_eq!(report.manifest, ManifestStatus::Missing);
}

#[tokio::test]
async fn pinning_unreadable_manifest_is_distinguishable() {
    let server = MockServer::start_async().await;
    mock_repo_and_manifest(&server, 200, "{ this is not json").await;
    let report = client_for(&server).version_pinning(REPO_URL).await.unwrap();
    assert_eq!(report.ratio, 1.0);
    assert_eq!(report.total, 0);
    assert_eq!(report.manifest, ManifestStatus::Unreadable);
}

#[tokio::test]
async fn pinning_propagates_server_errors() {
    let server = MockServer::start_async().await;
    mock_repo_and_manifest(&server, 503, "unavailable").await;
    let err = client_for(&server).version_pinning(REPO_URL).await.unwrap_err();
    assert_eq!(err.code(), "upstream_error");
}
