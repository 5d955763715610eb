use std::time::Duration;

use lcars_middleware::RequestCache;

const URL: &str = "https://api.example.test/tv/314/season/1/episode/1";

#[tokio::test]
async fn set_then_get_returns_the_payload_before_ttl() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RequestCache::new(dir.path(), true);

    cache.set(URL, b"payload", Duration::from_secs(60)).await.unwrap();
    assert_eq!(cache.get(URL).await.as_deref(), Some(&b"payload"[..]));

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
    assert!(stats.total_bytes > 0);
}

#[tokio::test]
async fn expired_entries_miss_and_are_removed_eagerly() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RequestCache::new(dir.path(), true);

    cache.set(URL, b"payload", Duration::from_millis(40)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert!(cache.get(URL).await.is_none());
    // The expired file is gone, not just skipped.
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 0);
}

#[tokio::test]
async fn disabled_cache_is_a_no_op_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RequestCache::new(dir.path(), false);

    cache.set(URL, b"payload", Duration::from_secs(60)).await.unwrap();
    assert!(cache.get(URL).await.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn cleanup_expired_scans_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RequestCache::new(dir.path(), true);

    cache.set("https://a.test/1", b"a", Duration::from_millis(30)).await.unwrap();
    cache.set("https://a.test/2", b"b", Duration::from_secs(60)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(cache.cleanup_expired().await, 1);
    assert_eq!(cache.get("https://a.test/2").await.as_deref(), Some(&b"b"[..]));
}

#[tokio::test]
async fn last_writer_wins_per_key() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RequestCache::new(dir.path(), true);

    cache.set(URL, b"first", Duration::from_secs(60)).await.unwrap();
    cache.set(URL, b"second", Duration::from_secs(60)).await.unwrap();
    assert_eq!(cache.get(URL).await.as_deref(), Some(&b"second"[..]));

    let stats = cache.stats().await;
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn corrupt_entries_are_dropped_as_misses() {
    let dir = tempfile::tempdir().unwrap();
    let cache = RequestCache::new(dir.path(), true);
    let path = dir
        .path()
        .join(format!("{}.json", RequestCache::fingerprint(URL)));
    std::fs::write(&path, b"not json").unwrap();

    assert!(cache.get(URL).await.is_none());
    assert!(!path.exists());
}

#[test]
fn fingerprints_are_stable_sha256() {
    assert_eq!(
        RequestCache::fingerprint("https://example.test/x"),
        RequestCache::fingerprint("https://example.test/x"),
    );
    assert_ne!(
        RequestCache::fingerprint("https://example.test/x"),
        RequestCache::fingerprint("https://example.test/y"),
    );
    assert_eq!(RequestCache::fingerprint("a").len(), 64);
}
