//! End-to-end research pipeline tests.
//!
//! The real Tavily provider talks to a local mock server, so these tests
//! cover the full path: planning, HTTP retrieval with retry, dedup,
//! budgeting, artifact assembly and persistence.

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wtt::research::budget::count_tokens;
use wtt::{
    ArtifactStore, ResearchConfig, ResearchError, ResearchPipeline, ResearchWorkflow,
    SqliteArtifactStore, TokenRef,
};
use wtt_search::{RetryPolicy, TavilyProvider, Topic};

const TECHNICAL: &str = "cryptocurrency token technology";
const DOCUMENTATION: &str = "official documentation";
const MARKET: &str = "token price market status";
const NEWS: &str = "latest news";

fn config_for(server: &MockServer) -> ResearchConfig {
    let mut config = ResearchConfig::default();
    config.search.api_key = Some("tvly-test-key".into());
    config.search.base_url = server.uri();
    config.search.cache_ttl_seconds = 0;
    config.search.retry = RetryPolicy::new().with_base_delay_ms(1).with_max_delay_ms(5);
    config.workflow.retry = RetryPolicy::new().with_base_delay_ms(1).with_max_delay_ms(5);
    config
}

fn pipeline_for(config: &ResearchConfig) -> ResearchPipeline<TavilyProvider> {
    let provider = TavilyProvider::new(&config.search).expect("provider");
    ResearchPipeline::new(provider, config).expect("pipeline")
}

fn hits(items: &[(&str, &str, &str)]) -> serde_json::Value {
    let results: Vec<serde_json::Value> = items
        .iter()
        .map(|(url, title, content)| {
            json!({"url": url, "title": title, "content": content, "score": 0.7})
        })
        .collect();
    json!({ "results": results })
}

async fn respond(server: &MockServer, facet: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains(facet))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn fail(server: &MockServer, facet: &str) {
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains(facet))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(server)
        .await;
}

/// Query 1 → A, B; query 2 → A again; query 3 fails; query 4 → C.
async fn example_coin_server() -> MockServer {
    let server = MockServer::start().await;
    respond(
        &server,
        TECHNICAL,
        hits(&[
            ("https://a.example/examplecoin", "ExampleCoin overview", "ExampleCoin is a layer-one chain."),
            ("https://b.example/consensus", "Consensus design", "It uses proof of stake."),
        ]),
    )
    .await;
    respond(
        &server,
        DOCUMENTATION,
        hits(&[("https://a.example/examplecoin", "A different title", "Duplicate body.")]),
    )
    .await;
    fail(&server, MARKET).await;
    respond(
        &server,
        NEWS,
        hits(&[("https://c.example/news", "ExampleCoin mainnet", "Mainnet launched this week.")]),
    )
    .await;
    server
}

#[tokio::test]
async fn example_coin_scenario_dedups_and_isolates_failure() {
    let server = example_coin_server().await;
    let config = config_for(&server);
    let pipeline = pipeline_for(&config);

    let artifact = pipeline.research("ExampleCoin").await.expect("artifact");

    let urls: Vec<&str> = artifact.documents().iter().map(|d| d.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://a.example/examplecoin",
            "https://b.example/consensus",
            "https://c.example/news",
        ]
    );
    assert_eq!(artifact.total_source_count(), 3);
    assert_eq!(artifact.documents()[0].title, "ExampleCoin overview");
    assert_eq!(artifact.documents()[0].origin, "technical");
    assert_eq!(artifact.duplicates_discarded(), 1);

    let stats = artifact.query_stats();
    assert_eq!((stats.planned, stats.succeeded, stats.failed), (4, 3, 1));

    let text = artifact.budgeted_text();
    assert!(text.starts_with("Source 1: ExampleCoin overview https://a.example/examplecoin."));
    assert!(text.contains("Source 3: ExampleCoin mainnet https://c.example/news."));
    assert!(count_tokens(text) <= config.budget.max_tokens);
}

#[tokio::test]
async fn failing_facet_retried_to_exhaustion() {
    let server = example_coin_server().await;
    let config = config_for(&server);
    let pipeline = pipeline_for(&config);

    pipeline.research("ExampleCoin").await.expect("artifact");

    let requests = server.received_requests().await.expect("recording enabled");
    let market_calls = requests
        .iter()
        .filter(|r| String::from_utf8_lossy(&r.body).contains(MARKET))
        .count();
    assert_eq!(market_calls, 3);
    assert_eq!(requests.len(), 6);
}

#[tokio::test]
async fn tight_budget_keeps_text_within_limit() {
    let server = example_coin_server().await;
    let mut config = config_for(&server);
    config.budget.max_tokens = 20;
    let pipeline = pipeline_for(&config);

    let artifact = pipeline.research("ExampleCoin").await.expect("artifact");

    assert_eq!(artifact.total_source_count(), 3);
    assert!(artifact.token_count() <= 20);
    assert_eq!(artifact.token_count(), count_tokens(artifact.budgeted_text()));
}

#[tokio::test]
async fn all_queries_failing_still_yields_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let config = config_for(&server);
    let pipeline = pipeline_for(&config);

    let artifact = pipeline.research("ExampleCoin").await.expect("artifact");

    assert!(artifact.is_empty());
    assert_eq!(artifact.total_source_count(), 0);
    assert_eq!(artifact.budgeted_text(), "");
    assert_eq!(artifact.query_stats().failed, 4);
}

#[tokio::test]
async fn newsworthy_plan_sends_news_topic_and_dates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "query": "ExampleCoin latest news 2026-10-15",
            "topic": "news",
            "days": 7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&[(
            "https://c.example/news",
            "News",
            "Fresh news.",
        )])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "query": "ExampleCoin token price market status October 2026",
            "topic": "general",
            "days": 30
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let pipeline = pipeline_for(&config);
    let date = NaiveDate::from_ymd_opt(2026, 10, 15).expect("date");

    let artifact = pipeline
        .research_on("ExampleCoin", date, Topic::News)
        .await
        .expect("artifact");
    assert_eq!(artifact.total_source_count(), 1);
}

#[tokio::test]
async fn empty_subject_makes_no_requests() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    let pipeline = pipeline_for(&config);

    let err = pipeline.research("   ").await.expect_err("invalid input");
    assert!(matches!(err, ResearchError::InvalidInput(_)));
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn workflow_persists_to_sqlite() {
    let server = example_coin_server().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = config_for(&server);
    config.store.path = Some(dir.path().join("research.db"));

    let store = SqliteArtifactStore::open(&config.store.database_path()).expect("store");
    let workflow = ResearchWorkflow::new(
        pipeline_for(&config),
        store,
        config.workflow.retry.clone(),
    );

    let record = workflow
        .run(&TokenRef::new(11, "ExampleCoin"))
        .await
        .expect("record");
    assert_eq!(record.artifact.total_source_count(), 3);

    let reopened = SqliteArtifactStore::open(&config.store.database_path()).expect("reopen");
    let stored = reopened.latest("ExampleCoin").expect("latest").expect("present");
    assert_eq!(stored.token_id, 11);
    assert_eq!(stored.artifact, record.artifact);
}
