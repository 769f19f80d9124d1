use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use roost_core::CoreError;

use crate::auth::Authenticator;
use crate::config::{Config, TOKEN_URL};
use crate::dispatch::{Dispatch, InboxDispatch, NoopDispatch, SubredditDispatch, UserDispatch};
use crate::handlers::HandlerSet;
use crate::rate_limit::RateLimiter;
use crate::reaper::{Fetch, Reaper, RetryConfig};
use crate::stream::Stream;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle for stopping a running engine from outside the run.
#[derive(Clone)]
pub struct StopHandle {
    shutdown: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Signals every stream to stop at its next yield point. Idempotent,
    /// and a no-op once the run has returned. In-flight requests and
    /// handler calls are never interrupted.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Runs all configured streams concurrently until one fails or a stop
/// is requested, sharing a single rate limiter and credential between
/// them.
pub struct Engine {
    streams: Vec<Stream>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("streams", &self.streams.len())
            .finish()
    }
}

impl Engine {
    /// Validates the configuration and assembles the shared plumbing
    /// plus one stream per subscription.
    pub fn new(config: Config, handlers: HandlerSet) -> Result<Self, CoreError> {
        config.validate()?;

        let identity = config.identity();
        let http = Client::builder()
            .user_agent(config.agent.as_str())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(CoreError::Network)?;

        let limiter = Arc::new(RateLimiter::new(config.rate, identity));
        let interval = limiter.interval();
        let auth = config
            .app
            .clone()
            .map(|app| Arc::new(Authenticator::new(http.clone(), app, TOKEN_URL)));
        let reaper: Arc<dyn Fetch> = Arc::new(Reaper::new(
            http,
            identity.host(),
            auth,
            limiter,
            RetryConfig::default(),
        ));

        let mut streams = Vec::new();

        let subreddit_dispatch: Arc<dyn Dispatch> = match &handlers.subreddit {
            Some(handler) => Arc::new(SubredditDispatch(handler.clone())),
            None => Arc::new(NoopDispatch),
        };
        for name in &config.subreddits {
            streams.push(Stream::new(
                format!("r/{name}"),
                format!("/r/{name}/new.json?limit=100&raw_json=1"),
                reaper.clone(),
                subreddit_dispatch.clone(),
            ));
        }

        let user_dispatch: Arc<dyn Dispatch> = match &handlers.user {
            Some(handler) => Arc::new(UserDispatch(handler.clone())),
            None => Arc::new(NoopDispatch),
        };
        for name in &config.users {
            streams.push(Stream::new(
                format!("u/{name}"),
                format!("/user/{name}/overview.json?limit=100&raw_json=1"),
                reaper.clone(),
                user_dispatch.clone(),
            ));
        }

        if config.inbox {
            let inbox_dispatch: Arc<dyn Dispatch> = match &handlers.inbox {
                Some(handler) => Arc::new(InboxDispatch(handler.clone())),
                None => Arc::new(NoopDispatch),
            };
            streams.push(Stream::new(
                "inbox",
                "/message/inbox.json?limit=100&raw_json=1",
                reaper,
                inbox_dispatch,
            ));
        }

        info!(
            streams = streams.len(),
            identity = ?identity,
            interval_ms = interval.as_millis() as u64,
            "engine assembled"
        );

        Ok(Self::from_streams(streams))
    }

    pub(crate) fn from_streams(streams: Vec<Stream>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            streams,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Number of streams the configuration materialized into.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Handle for requesting a stop while `run` is in progress.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Drives every stream to completion.
    ///
    /// The first stream error becomes the run result; the remaining
    /// streams are signaled to stop and the call returns only after all
    /// of them have wound down. An external stop produces `Ok(())` with
    /// the same drain discipline. An empty stream set returns
    /// immediately.
    pub async fn run(self) -> Result<(), CoreError> {
        let Engine { streams, shutdown } = self;

        if streams.is_empty() {
            debug!("no streams configured, nothing to run");
            return Ok(());
        }

        let mut tasks: FuturesUnordered<JoinHandle<Result<(), CoreError>>> = streams
            .into_iter()
            .map(|stream| {
                let receiver = shutdown.subscribe();
                tokio::spawn(stream.run(receiver))
            })
            .collect();

        let mut outcome = Ok(());
        while let Some(joined) = tasks.next().await {
            let result = joined.unwrap_or_else(|e| {
                Err(CoreError::internal(format!("stream task panicked: {e}")))
            });
            if let Err(e) = result {
                error!("stream failed: {e}");
                if outcome.is_ok() {
                    outcome = Err(e);
                }
                shutdown.send_replace(true);
            }
        }

        info!(clean = outcome.is_ok(), "engine run finished");
        outcome
    }
}
