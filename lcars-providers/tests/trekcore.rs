use std::sync::Arc;

use lcars_core::{CancelToken, MetadataProvider};
use lcars_mock::MockFetcher;
use lcars_providers::TrekCoreClient;
use lcars_types::{EpisodeId, MetadataSource};

const URL: &str = "https://ent.trekcore.com/episodes/season1/ent1x01.php";

fn id() -> EpisodeId {
    "ent_s1_e01".parse().unwrap()
}

#[test]
fn urls_follow_the_subdomain_convention() {
    assert_eq!(TrekCoreClient::episode_url(&id()), URL);
    let late: EpisodeId = "voy_s4_e07".parse().unwrap();
    assert_eq!(
        TrekCoreClient::episode_url(&late),
        "https://voy.trekcore.com/episodes/season4/voy4x07.php"
    );
}

#[tokio::test]
async fn scrapes_title_and_description() {
    let html = br#"<html><head>
        <title>Broken Bow - ENT Season 1 - TrekCore</title>
        <meta name="description" content="Captain Archer leads Enterprise on her maiden voyage.">
        </head><body></body></html>"#;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_ok(URL, html);
    let client = TrekCoreClient::new(Arc::clone(&fetcher) as _, None);

    let record = client
        .fetch_episode(&id(), &CancelToken::new())
        .await
        .unwrap()
        .expect("record");

    assert_eq!(record.source, MetadataSource::TrekCore);
    assert_eq!(record.title.as_deref(), Some("Broken Bow"));
    assert_eq!(
        record.synopsis.as_deref(),
        Some("Captain Archer leads Enterprise on her maiden voyage.")
    );
}

#[tokio::test]
async fn a_404_page_is_no_data() {
    let fetcher = Arc::new(MockFetcher::new());
    let client = TrekCoreClient::new(Arc::clone(&fetcher) as _, None);
    let result = client.fetch_episode(&id(), &CancelToken::new()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn pages_without_usable_content_are_no_data() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.push_ok(URL, b"<html><head></head><body>nothing here</body></html>");
    let client = TrekCoreClient::new(Arc::clone(&fetcher) as _, None);
    let result = client.fetch_episode(&id(), &CancelToken::new()).await.unwrap();
    assert!(result.is_none());
}
