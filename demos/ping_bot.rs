//! Minimal roost bot: announces new posts from a subreddit.
//!
//! Run with `cargo run --example ping_bot -- <subreddit>`. Without
//! login credentials it polls anonymously, so the rate floor is one
//! request every two seconds.

use roost::{Config, HandlerSet, SubredditHandler};
use roost_core::Post;

struct Announcer;

#[async_trait::async_trait]
impl SubredditHandler for Announcer {
    async fn handle_post(&self, post: Post) -> anyhow::Result<()> {
        println!(
            "[r/{}] {} (https://reddit.com{})",
            post.subreddit, post.title, post.permalink
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("roost=debug")
        .init();

    let subreddit = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "rust".to_string());

    let config = Config {
        agent: format!("unix:roost-ping-bot:0.3 (watching r/{subreddit})"),
        subreddits: vec![subreddit],
        ..Config::default()
    };

    roost::run(config, HandlerSet::new().with_subreddit_handler(Announcer)).await?;
    Ok(())
}
