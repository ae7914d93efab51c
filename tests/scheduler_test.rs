//! Scheduler behaviour: tick skipping, shutdown and storage outages.

#![cfg(feature = "sqlite")]

mod common;

use std::time::Duration;

use common::{build_scheduler, rss_feed, setup_db, test_config, Fixture, FixtureServer, TestItem};
use perspectiva::ArticleRepository;

fn feed_body(prefix: &str) -> String {
    rss_feed(
        prefix,
        &[TestItem::new(format!("https://example.com/{prefix}/1"), "Item")
            .with_description("Something happened.")],
    )
}

fn slow(prefix: &str, millis: u64) -> Fixture {
    Fixture::Slow {
        delay: Duration::from_millis(millis),
        body: feed_body(prefix),
    }
}

#[tokio::test]
async fn test_cycle_does_not_start_while_one_is_running() {
    let server = FixtureServer::start().await;
    server.set("/slow", slow("slow", 300));
    let db = setup_db().await;
    let scheduler = build_scheduler(db, &test_config(&[server.url("/slow")]));

    let first = scheduler.try_start_cycle().expect("first cycle starts");
    assert!(scheduler.try_start_cycle().is_none());

    let report = first.await.unwrap().unwrap();
    assert_eq!(report.inserted(), 1);
    assert!(scheduler.try_start_cycle().is_some());
}

#[tokio::test]
async fn test_run_skips_ticks_during_slow_cycle() {
    let server = FixtureServer::start().await;
    server.set("/slow", slow("slow", 400));
    let db = setup_db().await;
    let scheduler = build_scheduler(db, &test_config(&[server.url("/slow")]))
        .with_interval(Duration::from_millis(50));
    let shutdown = scheduler.context().shutdown_handle();

    let task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    };
    tokio::time::sleep(Duration::from_millis(250)).await;
    shutdown.shutdown();
    task.await.unwrap();

    let health = scheduler.health().snapshot().await;
    assert_eq!(health.cycles_run, 1);
    assert!(health.ticks_skipped >= 1);
    assert!(!health.cycle_in_progress);
    assert_eq!(server.hits("/slow"), 1);
}

#[tokio::test]
async fn test_run_repeats_cycles() {
    let server = FixtureServer::start().await;
    server.set("/rss", Fixture::Feed(feed_body("fast")));
    let db = setup_db().await;
    let scheduler = build_scheduler(db.clone(), &test_config(&[server.url("/rss")]))
        .with_interval(Duration::from_millis(50));
    let shutdown = scheduler.context().shutdown_handle();

    let task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown.shutdown();
    task.await.unwrap();

    let health = scheduler.health().snapshot().await;
    assert!(health.cycles_run >= 2);
    assert_eq!(health.cycles_failed, 0);
    assert!(health.last_success_at.is_some());
    assert_eq!(ArticleRepository::new(db.pool()).count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_shutdown_stops_dispatching_feeds() {
    let server = FixtureServer::start().await;
    server.set("/first", slow("first", 300));
    server.set("/second", slow("second", 300));
    let db = setup_db().await;
    let mut config = test_config(&[server.url("/first"), server.url("/second")]);
    config.ingest.max_concurrent_fetches = 1;
    let scheduler = build_scheduler(db, &config);

    let cycle = scheduler.try_start_cycle().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    scheduler.context().shutdown_handle().shutdown();

    let report = cycle.await.unwrap().unwrap();
    assert!(report.interrupted);
    assert_eq!(report.feeds.len(), 1);
    assert_eq!(report.feeds[0].inserted, 1);
    assert_eq!(server.hits("/second"), 0);
}

#[tokio::test]
async fn test_unreachable_storage_fails_cycle_but_scheduling_continues() {
    let server = FixtureServer::start().await;
    server.set("/rss", Fixture::Feed(feed_body("a")));
    let db = setup_db().await;
    let scheduler = build_scheduler(db.clone(), &test_config(&[server.url("/rss")]))
        .with_interval(Duration::from_millis(30));

    db.close().await;

    let err = scheduler.run_cycle_now().await.unwrap_err();
    assert!(err.is_storage());
    let health = scheduler.health().snapshot().await;
    assert_eq!(health.cycles_failed, 1);
    assert!(health.last_error.is_some());
    assert!(health.last_success_at.is_none());

    let shutdown = scheduler.context().shutdown_handle();
    let task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.shutdown();
    task.await.unwrap();

    let health = scheduler.health().snapshot().await;
    assert!(health.cycles_failed >= 3);
    assert_eq!(server.hits("/rss"), 0);
}

#[tokio::test]
async fn test_cycle_where_every_feed_fails_is_not_a_success() {
    let server = FixtureServer::start().await;
    server.set("/gone", Fixture::Status(404));
    let db = setup_db().await;
    let scheduler = build_scheduler(db, &test_config(&[server.url("/gone")]));

    let report = scheduler.run_cycle_now().await.unwrap();
    assert_eq!(report.failed_feeds(), 1);

    let health = scheduler.health().snapshot().await;
    assert_eq!(health.cycles_run, 1);
    assert_eq!(health.cycles_failed, 1);
    assert!(health.last_success_at.is_none());
    assert!(health.last_error.unwrap().contains("404"));
}

#[tokio::test]
async fn test_zero_interval_is_clamped() {
    let server = FixtureServer::start().await;
    server.set("/rss", Fixture::Feed(feed_body("zero")));
    let db = setup_db().await;
    let scheduler =
        build_scheduler(db, &test_config(&[server.url("/rss")])).with_interval(Duration::ZERO);
    let shutdown = scheduler.context().shutdown_handle();

    let task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.shutdown();
    task.await.unwrap();

    assert!(scheduler.health().snapshot().await.cycles_run >= 1);
}
