//! Polling framework for Reddit bots.
//!
//! A bot registers handlers for the roles it cares about (subreddit
//! posts, user activity, the inbox), lists its subscriptions in a
//! [`Config`], and hands both to [`run`]. The engine polls every target
//! concurrently under one shared request-rate budget, de-duplicates
//! each listing against a per-stream cursor, and delivers new items to
//! the handlers oldest first. A handler or fetch error stops the whole
//! run and is returned as the run result.
//!
//! ```no_run
//! use roost::{Config, HandlerSet, SubredditHandler};
//! use roost_core::Post;
//!
//! struct Announcer;
//!
//! #[async_trait::async_trait]
//! impl SubredditHandler for Announcer {
//!     async fn handle_post(&self, post: Post) -> anyhow::Result<()> {
//!         println!("[r/{}] {}", post.subreddit, post.title);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), roost::CoreError> {
//!     let config = Config {
//!         agent: "unix:roost-announcer:0.3 (by /u/example)".to_string(),
//!         subreddits: vec!["rust".to_string()],
//!         ..Config::default()
//!     };
//!     roost::run(config, HandlerSet::new().with_subreddit_handler(Announcer)).await
//! }
//! ```
//!
//! Cursors live in memory only: a restarted process picks up from "now"
//! rather than where it left off. Callers needing exactly-once delivery
//! across restarts must persist their own watermark.

mod auth;
mod config;
mod dispatch;
mod engine;
mod handlers;
mod rate_limit;
mod reaper;
mod stream;

#[cfg(test)]
mod tests;

pub use auth::Authenticator;
pub use config::{AppSecrets, Config, Identity};
pub use engine::{Engine, StopHandle};
pub use handlers::{HandlerSet, InboxHandler, SubredditHandler, UserHandler};
pub use rate_limit::RateLimiter;
pub use reaper::{Fetch, Reaper, RetryConfig};

pub use roost_core::{ApiError, Comment, ConfigError, CoreError, Message, Post, Thing};

/// Runs a bot until a handler or fetch fails or a [`StopHandle`] fires.
///
/// Convenience for [`Engine::new`] followed by [`Engine::run`]; build
/// the engine directly to keep a stop handle.
pub async fn run(config: Config, handlers: HandlerSet) -> Result<(), CoreError> {
    Engine::new(config, handlers)?.run().await
}
