//! Cross-component scenarios: engine orchestration over scripted
//! fetchers and real dispatch proxies.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tokio_test::assert_ok;

use roost_core::{CoreError, Post, Thing};

use crate::config::Config;
use crate::dispatch::{NoopDispatch, SubredditDispatch};
use crate::engine::Engine;
use crate::handlers::{HandlerSet, SubredditHandler};
use crate::reaper::Fetch;
use crate::stream::Stream;

fn post(name: &str) -> Thing {
    Thing::Post {
        data: Post {
            id: name.trim_start_matches("t3_").to_string(),
            name: name.to_string(),
            title: format!("{name} title"),
            ..Post::default()
        },
    }
}

/// Serves scripted pages, then empty pages forever. The short sleep
/// keeps an idle stream from monopolizing a single-threaded runtime.
struct ScriptedFetch {
    pages: Mutex<VecDeque<Vec<Thing>>>,
}

impl ScriptedFetch {
    fn new(pages: Vec<Vec<Thing>>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages.into()),
        })
    }

    fn idle() -> Arc<Self> {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn fetch(&self, _path: &str) -> Result<Vec<Thing>, CoreError> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }
}

#[derive(Default)]
struct CountingHandler {
    count: AtomicUsize,
}

#[async_trait]
impl SubredditHandler for CountingHandler {
    async fn handle_post(&self, _post: Post) -> anyhow::Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingHandler;

#[async_trait]
impl SubredditHandler for FailingHandler {
    async fn handle_post(&self, post: Post) -> anyhow::Result<()> {
        anyhow::bail!("refusing {}", post.name)
    }
}

#[tokio::test]
async fn handler_error_fails_fast_and_stops_every_stream() {
    let counting = Arc::new(CountingHandler::default());

    let a = Stream::new(
        "r/a",
        "/r/a/new.json",
        ScriptedFetch::idle(),
        Arc::new(SubredditDispatch(counting.clone())),
    );
    // Stream b delivers on its second poll (the first seeds the cursor)
    // and its handler refuses the item.
    let b = Stream::new(
        "r/b",
        "/r/b/new.json",
        ScriptedFetch::new(vec![
            vec![post("t3_b1")],
            vec![post("t3_b2"), post("t3_b1")],
        ]),
        Arc::new(SubredditDispatch(Arc::new(FailingHandler))),
    );
    let c = Stream::new(
        "r/c",
        "/r/c/new.json",
        ScriptedFetch::idle(),
        Arc::new(SubredditDispatch(counting.clone())),
    );

    let engine = Engine::from_streams(vec![a, b, c]);
    let err = engine.run().await.unwrap_err();

    match err {
        CoreError::Stream { ref target, ref source } => {
            assert_eq!(target, "r/b");
            assert!(matches!(**source, CoreError::Handler { .. }));
        }
        other => panic!("expected a stream error, got {other}"),
    }

    // run() only returns after every stream has wound down, so no
    // further handler invocations can happen.
    let after_run = counting.count.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(counting.count.load(Ordering::SeqCst), after_run);
}

#[tokio::test]
async fn external_stop_returns_clean_and_is_idempotent() {
    let counting = Arc::new(CountingHandler::default());
    let stream = Stream::new(
        "r/a",
        "/r/a/new.json",
        ScriptedFetch::idle(),
        Arc::new(SubredditDispatch(counting)),
    );

    let engine = Engine::from_streams(vec![stream]);
    let handle = engine.stop_handle();
    let run = tokio::spawn(engine.run());

    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.stop();
    handle.stop();

    tokio_test::assert_ok!(run.await.unwrap());

    // After the run has returned, stop is still a no-op.
    handle.stop();
}

#[tokio::test]
async fn stop_before_run_wins_immediately() {
    let stream = Stream::new(
        "r/a",
        "/r/a/new.json",
        ScriptedFetch::idle(),
        Arc::new(NoopDispatch),
    );
    let engine = Engine::from_streams(vec![stream]);
    engine.stop_handle().stop();
    tokio_test::assert_ok!(engine.run().await);
}

#[tokio::test]
async fn zero_streams_return_immediately() {
    let config = Config {
        agent: "unix:roost:test".to_string(),
        ..Config::default()
    };
    let engine = Engine::new(config, HandlerSet::new()).unwrap();
    assert_eq!(engine.stream_count(), 0);
    assert!(engine.run().await.is_ok());
}

#[tokio::test]
async fn engine_builds_one_stream_per_subscription() {
    let config = Config {
        agent: "unix:roost:test".to_string(),
        app: Some(crate::config::AppSecrets {
            id: "id".to_string(),
            secret: "secret".to_string(),
            username: "user".to_string(),
            password: "hunter2".to_string(),
        }),
        subreddits: vec!["rust".to_string(), "programming".to_string()],
        users: vec!["spez".to_string()],
        inbox: true,
        ..Config::default()
    };

    let engine = Engine::new(config, HandlerSet::new()).unwrap();
    assert_eq!(engine.stream_count(), 4);
}

#[tokio::test]
async fn misconfiguration_never_reaches_the_engine() {
    let config = Config {
        agent: "unix:roost:test".to_string(),
        inbox: true,
        ..Config::default()
    };
    let err = Engine::new(config, HandlerSet::new()).unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));
}

#[tokio::test]
async fn streams_with_unregistered_roles_still_poll_into_noops() {
    // One subscribed subreddit, no subreddit handler: deliveries vanish
    // into the no-op but the cursor machinery still runs.
    let stream = Stream::new(
        "r/a",
        "/r/a/new.json",
        ScriptedFetch::new(vec![
            vec![post("t3_a1")],
            vec![post("t3_a2"), post("t3_a1")],
        ]),
        Arc::new(NoopDispatch),
    );
    let engine = Engine::from_streams(vec![stream]);
    let handle = engine.stop_handle();

    let run = tokio::spawn(engine.run());
    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.stop();
    assert!(run.await.unwrap().is_ok());
}
