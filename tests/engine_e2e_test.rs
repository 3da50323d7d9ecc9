//! End-to-end crawl tests against an in-memory fetcher

use futures::future::BoxFuture;
use kodegen_tools_snapcrawl::content_store::InsertRecord;
use kodegen_tools_snapcrawl::crawl_engine::{FixedSampler, NoOpProgress};
use kodegen_tools_snapcrawl::{
    ConfigError, CrawlConfig, CrawlEngine, CrawlError, EpochPhase, FetchError, Fetcher,
    FilterProfile, RunOptions, list_snapshots,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

mod common;
use common::{FakeFetcher, create_test_config, create_test_html, test_registry, test_url};

fn one_epoch(make_snapshot: bool) -> RunOptions {
    RunOptions {
        epoch_count: 1,
        secs_per_epoch: 1,
        start_epoch: 0,
        make_snapshot,
    }
}

/// Seed page linking to one article, two sections and one off-site page
fn small_site() -> FakeFetcher {
    FakeFetcher::new()
        .with_page(
            test_url("/index"),
            create_test_html(
                "Index",
                &[
                    "/articles/1.html",
                    "/section/a/",
                    "/section/b#top",
                    "https://elsewhere.test/x",
                ],
            ),
        )
        .with_page(test_url("/articles/1.html"), create_test_html("  Article\n One ", &[]))
        .with_page(test_url("/section/a"), create_test_html("Section A", &[]))
        .with_page(test_url("/section/b"), create_test_html("Section B", &[]))
}

fn engine_with(dir: &TempDir, fetcher: Arc<FakeFetcher>, capacity: usize) -> CrawlEngine {
    let config = create_test_config(dir.path(), 1, capacity);
    CrawlEngine::create(config, &test_registry())
        .unwrap()
        .with_fetcher(fetcher)
        .with_sampler(Arc::new(FixedSampler(0.0)))
        .with_progress(Arc::new(NoOpProgress))
}

#[tokio::test]
async fn test_single_epoch_crawls_and_persists_strict_pages() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(small_site());
    let engine = engine_with(&dir, Arc::clone(&fetcher), 100);

    assert_eq!(engine.seed([test_url("/index")]), 1);
    let stats = engine.run(one_epoch(false)).await.unwrap();

    assert_eq!(engine.phase(), EpochPhase::Idle);
    assert_eq!(stats.fetched, 4);
    assert_eq!(stats.saved, 1);
    assert_eq!(stats.fetch_failed, 0);

    let entries = engine.store().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].url, test_url("/articles/1.html"));
    assert_eq!(entries[0].title, "Article One");

    for path in ["/index", "/articles/1.html", "/section/a", "/section/b"] {
        assert!(engine.met_urls().contains(&test_url(path)), "{path} not marked seen");
    }
    assert!(engine.saved_urls().contains(&test_url("/articles/1.html")));
    assert!(!engine.saved_urls().contains(&test_url("/section/a")));

    // Off-site links are rejected, and every page is fetched once
    assert!(!fetcher.requests().iter().any(|u| u.contains("elsewhere.test")));
    assert_eq!(fetcher.request_count(&test_url("/index")), 1);
    assert!(engine.frontier().is_empty());

    // End-of-epoch save wrote the live state
    assert!(dir.path().join("crawler.json").exists());
    assert!(dir.path().join("met_urls/bits.bin").exists());
}

#[tokio::test]
async fn test_fetch_failure_does_not_mark_seen() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(FakeFetcher::new());
    let engine = engine_with(&dir, Arc::clone(&fetcher), 100);

    engine.seed([test_url("/missing")]);
    let stats = engine.run(one_epoch(false)).await.unwrap();

    assert_eq!(stats.fetch_failed, 1);
    assert!(!engine.met_urls().contains(&test_url("/missing")));
    assert!(engine.store().is_empty());
}

#[tokio::test]
async fn test_per_page_enqueue_cap() {
    let dir = TempDir::new().unwrap();
    let links: Vec<String> = (0..30).map(|i| format!("/section/{i}")).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    let fetcher = Arc::new(
        FakeFetcher::new().with_page(test_url("/index"), create_test_html("Index", &link_refs)),
    );
    // Capacity 50 with the default ratio of 0.1 allows five links per page
    let engine = engine_with(&dir, Arc::clone(&fetcher), 50);
    engine.seed([test_url("/index")]);

    let stats = engine.run(one_epoch(false)).await.unwrap();
    assert_eq!(stats.enqueued, 5);
    // Index plus the five admitted sections, which all 404
    assert_eq!(fetcher.requests().len(), 6);
}

#[tokio::test]
async fn test_snapshot_restore_rolls_back_engine_state() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir, Arc::new(FakeFetcher::new()), 100);

    let queued = vec![test_url("/q/1"), test_url("/q/2"), test_url("/q/3")];
    engine.seed(queued.clone());
    engine.met_urls().add(&test_url("/before"));
    engine
        .store()
        .insert(InsertRecord::new(b"<p>one</p>".to_vec(), test_url("/articles/1.html"), "One"))
        .unwrap();
    engine.make_snapshot("20240101_000000_000000").unwrap();

    // Diverge after the snapshot
    engine.met_urls().add(&test_url("/after"));
    engine
        .store()
        .insert(InsertRecord::new(b"<p>two</p>".to_vec(), test_url("/articles/2.html"), "Two"))
        .unwrap();
    let _ = engine.frontier().try_pop();
    engine.make_snapshot("20240102_000000_000000").unwrap();
    engine.save().unwrap();
    drop(engine);

    let restored =
        CrawlEngine::load_snapshot(dir.path(), "20240101_000000_000000", &test_registry()).unwrap();

    assert_eq!(restored.frontier().snapshot_contents(), queued);
    assert!(restored.met_urls().contains(&test_url("/before")));
    assert_eq!(restored.file_count(), 1);
    assert_eq!(restored.store().entries()[0].title, "One");

    let blobs = std::fs::read_dir(dir.path().join("saved_files/contents"))
        .unwrap()
        .count();
    assert_eq!(blobs, 1, "orphaned blob should be deleted");
    assert_eq!(
        list_snapshots(dir.path()).unwrap(),
        vec!["20240101_000000_000000".to_string()]
    );

    // The rollback is durable: reopening the live state sees the same thing
    drop(restored);
    let reopened = CrawlEngine::open(dir.path(), &test_registry()).unwrap();
    assert_eq!(reopened.frontier().snapshot_contents(), queued);
    assert_eq!(reopened.file_count(), 1);
}

#[tokio::test]
async fn test_save_and_open_round_trip() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(small_site());
    let engine = engine_with(&dir, fetcher, 100);
    engine.seed([test_url("/index")]);
    engine.run(one_epoch(false)).await.unwrap();
    engine.seed([test_url("/later")]);
    engine.save().unwrap();
    drop(engine);

    let reopened = CrawlEngine::open(dir.path(), &test_registry()).unwrap();
    assert_eq!(reopened.file_count(), 1);
    assert!(reopened.met_urls().contains(&test_url("/section/b")));
    assert_eq!(reopened.frontier().snapshot_contents(), vec![test_url("/later")]);
    assert_eq!(reopened.config().max_queue_size(), 100);
}

#[tokio::test]
async fn test_each_epoch_writes_a_sorted_snapshot() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir, Arc::new(small_site()), 100);
    engine.seed([test_url("/index")]);

    engine
        .run(RunOptions {
            epoch_count: 2,
            secs_per_epoch: 1,
            start_epoch: 0,
            make_snapshot: true,
        })
        .await
        .unwrap();

    let names = list_snapshots(dir.path()).unwrap();
    assert_eq!(names.len(), 2);
    assert!(names[0] < names[1]);
    for name in &names {
        let snap = dir.path().join("snapshots").join(name);
        for part in ["crawler.json", "met_urls", "saved_urls", "saved_files"] {
            assert!(snap.join(part).exists(), "{name} lacks {part}");
        }
    }

    let latest = CrawlEngine::load_latest(dir.path(), &test_registry()).unwrap();
    assert_eq!(latest.file_count(), 1);
}

#[tokio::test]
async fn test_request_stop_ends_run_early() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(engine_with(&dir, Arc::new(FakeFetcher::new()), 100));

    let stopper = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            engine.request_stop();
        })
    };

    let started = Instant::now();
    engine
        .run(RunOptions {
            epoch_count: 5,
            secs_per_epoch: 30,
            start_epoch: 0,
            make_snapshot: false,
        })
        .await
        .unwrap();
    stopper.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(engine.stop_requested());
}

#[tokio::test]
async fn test_unknown_profile_is_config_error() {
    let dir = TempDir::new().unwrap();
    let config = kodegen_tools_snapcrawl::CrawlConfig::builder()
        .storage_dir(dir.path())
        .filter_profile("no-such-profile")
        .build()
        .unwrap();

    let result = CrawlEngine::create(config, &test_registry());
    assert!(matches!(
        result,
        Err(CrawlError::Config(ConfigError::UnknownFilterProfile(name))) if name == "no-such-profile"
    ));
}

#[tokio::test]
async fn test_missing_state_is_reported() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        CrawlEngine::open(dir.path(), &test_registry()),
        Err(CrawlError::NotFound(_))
    ));
    assert!(matches!(
        CrawlEngine::load_latest(dir.path(), &test_registry()),
        Err(CrawlError::Snapshot(_))
    ));
    assert!(matches!(
        CrawlEngine::load_snapshot(dir.path(), "20240101_000000_000000", &test_registry()),
        Err(CrawlError::Snapshot(_))
    ));
}

#[tokio::test]
async fn test_interrupted_snapshot_is_invisible() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir, Arc::new(FakeFetcher::new()), 100);
    engine.seed([test_url("/q/1")]);
    engine.make_snapshot("20240101_000000_000000").unwrap();

    let snapshots = dir.path().join("snapshots");
    let entries: Vec<_> = std::fs::read_dir(&snapshots)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["20240101_000000_000000".to_string()]);

    // What a crash after the first part of a later snapshot leaves behind
    let partial = snapshots.join(".20240102_000000_000000.tmp");
    std::fs::create_dir_all(&partial).unwrap();
    std::fs::copy(dir.path().join("crawler.json"), partial.join("crawler.json")).unwrap();
    drop(engine);

    assert_eq!(
        list_snapshots(dir.path()).unwrap(),
        vec!["20240101_000000_000000".to_string()]
    );
    let latest = CrawlEngine::load_latest(dir.path(), &test_registry()).unwrap();
    assert_eq!(latest.frontier().snapshot_contents(), vec![test_url("/q/1")]);
}

#[tokio::test]
async fn test_fresh_crawl_discards_previous_state() {
    let dir = TempDir::new().unwrap();
    let old = engine_with(&dir, Arc::new(FakeFetcher::new()), 100);
    old.seed([test_url("/old-frontier")]);
    old.met_urls().add(&test_url("/old-seen"));
    old.saved_urls().add(&test_url("/articles/old.html"));
    old.make_snapshot("20240101_000000_000000").unwrap();
    old.save().unwrap();
    drop(old);

    // Dropped without saving, as if the process died right after startup
    let fresh = engine_with(&dir, Arc::new(FakeFetcher::new()), 100);
    drop(fresh);

    let reopened = CrawlEngine::open(dir.path(), &test_registry()).unwrap();
    assert!(reopened.frontier().is_empty());
    assert!(!reopened.met_urls().contains(&test_url("/old-seen")));
    assert!(!reopened.saved_urls().contains(&test_url("/articles/old.html")));
    assert_eq!(reopened.file_count(), 0);
    assert!(list_snapshots(dir.path()).unwrap().is_empty());
}

/// A fetch that never completes
struct HangingFetcher;

impl Fetcher for HangingFetcher {
    fn fetch<'a>(
        &'a self,
        _url: &'a str,
        _headers: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(futures::future::pending())
    }
}

#[tokio::test]
async fn test_stuck_worker_is_aborted_and_epoch_completes() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 1, 100);
    assert_eq!(config.grace_period(), Duration::from_secs(2));
    let engine = CrawlEngine::create(config, &test_registry())
        .unwrap()
        .with_fetcher(Arc::new(HangingFetcher))
        .with_progress(Arc::new(NoOpProgress));
    engine.seed([test_url("/index")]);

    let started = Instant::now();
    engine.run(one_epoch(true)).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(2), "grace period was skipped: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(6), "run hung on a stuck worker: {elapsed:?}");
    assert_eq!(engine.phase(), EpochPhase::Idle);
    assert!(!engine.met_urls().contains(&test_url("/index")));
    assert_eq!(list_snapshots(dir.path()).unwrap().len(), 1);

    drop(engine);
    let reopened = CrawlEngine::open(dir.path(), &test_registry()).unwrap();
    assert!(reopened.frontier().is_empty());
}

#[tokio::test]
async fn test_reseeded_bypass_seed_is_fetched_every_epoch() {
    let dir = TempDir::new().unwrap();
    let mut registry = test_registry();
    registry.register(
        FilterProfile::new(
            "seeded",
            |url| url.starts_with(&test_url("/articles/")),
            |url| url.starts_with(&test_url("/")),
        )
        .with_seeds(vec![test_url("/index")], true),
    );
    let config = CrawlConfig::builder()
        .storage_dir(dir.path())
        .filter_profile("seeded")
        .max_workers(1)
        .interval_ms(0)
        .max_queue_size(100)
        .met_capacity(10_000)
        .saved_capacity(10_000)
        .error_rate(1e-4)
        .tick_interval_secs(1)
        .build()
        .unwrap();
    let fetcher = Arc::new(small_site());
    let engine = CrawlEngine::create(config, &registry)
        .unwrap()
        .with_fetcher(Arc::clone(&fetcher) as Arc<dyn Fetcher>)
        .with_sampler(Arc::new(FixedSampler(0.0)))
        .with_progress(Arc::new(NoOpProgress));

    for epoch in 0..2 {
        assert_eq!(engine.reseed_random(1), 1);
        engine
            .run(RunOptions {
                epoch_count: 1,
                secs_per_epoch: 1,
                start_epoch: epoch,
                make_snapshot: false,
            })
            .await
            .unwrap();
    }

    // The seed bypasses the seen sketch; what it links to does not
    assert_eq!(fetcher.request_count(&test_url("/index")), 2);
    assert_eq!(fetcher.request_count(&test_url("/section/a")), 1);
    assert_eq!(fetcher.request_count(&test_url("/articles/1.html")), 1);
    assert_eq!(engine.file_count(), 1);
}
