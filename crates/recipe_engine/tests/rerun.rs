use chrono::Utc;
use pretty_assertions::assert_eq;
use recipe_core::{CrawlTarget, ParserVersion, ProcessingStatus};
use recipe_engine::{reset_outdated_targets, CrawlStore, MemoryStore};

async fn finished(store: &MemoryStore, url: &str, version: u32) -> u64 {
    let mut target = CrawlTarget::parse(url, Utc::now()).unwrap();
    target.begin_download(Utc::now());
    target.download_succeeded("<html></html>".to_string(), Utc::now());
    target.finish_success(ParserVersion(version), Utc::now());
    store.insert_target(target).await.unwrap()
}

#[tokio::test]
async fn only_older_processed_targets_are_reset() {
    crawl_logging::initialize_for_tests();
    let store = MemoryStore::new();
    let old = finished(&store, "https://soup.example/old", 1).await;
    let current = finished(&store, "https://soup.example/current", 2).await;
    let never = store
        .insert_target(CrawlTarget::parse("https://soup.example/new", Utc::now()).unwrap())
        .await
        .unwrap();

    let reset = reset_outdated_targets(&store, ParserVersion(2)).await.unwrap();
    assert_eq!(reset, 1);

    let old = store.target(old).await.unwrap().unwrap();
    assert_eq!(old.status, ProcessingStatus::NotStarted);
    assert_eq!(old.parser_version, ParserVersion(1));
    // Cached html survives so the reprocessing pass skips the network.
    assert!(old.raw_html.is_some());

    let current = store.target(current).await.unwrap().unwrap();
    assert_eq!(current.status, ProcessingStatus::FinishedSuccess);
    let never = store.target(never).await.unwrap().unwrap();
    assert_eq!(never.status, ProcessingStatus::NotStarted);
    assert_eq!(never.parser_version, ParserVersion(0));

    assert_eq!(reset_outdated_targets(&store, ParserVersion(2)).await.unwrap(), 0);
}
