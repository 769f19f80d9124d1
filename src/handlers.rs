use std::sync::Arc;

use async_trait::async_trait;

use roost_core::{Comment, Message, Post};

/// Receives new posts from watched subreddits.
///
/// Handler calls for one stream are strictly sequential and oldest
/// first; returning an error stops the whole run.
#[async_trait]
pub trait SubredditHandler: Send + Sync {
    async fn handle_post(&self, post: Post) -> anyhow::Result<()>;
}

/// Receives new activity from watched users. Override the methods for
/// the item kinds the bot cares about; the rest default to no-ops.
#[async_trait]
pub trait UserHandler: Send + Sync {
    async fn handle_post(&self, post: Post) -> anyhow::Result<()> {
        let _ = post;
        Ok(())
    }

    async fn handle_comment(&self, comment: Comment) -> anyhow::Result<()> {
        let _ = comment;
        Ok(())
    }
}

/// Receives new inbox items for the logged-in account.
#[async_trait]
pub trait InboxHandler: Send + Sync {
    async fn handle_message(&self, message: Message) -> anyhow::Result<()>;

    /// Comment replies arrive in the inbox as comments, not messages.
    async fn handle_comment_reply(&self, comment: Comment) -> anyhow::Result<()> {
        let _ = comment;
        Ok(())
    }
}

/// The capabilities a bot registers for a run.
///
/// Roles without a registered handler still poll their subscribed
/// targets but deliver into a no-op, so a bot can watch one role
/// without implementing the others.
#[derive(Clone, Default)]
pub struct HandlerSet {
    pub(crate) subreddit: Option<Arc<dyn SubredditHandler>>,
    pub(crate) user: Option<Arc<dyn UserHandler>>,
    pub(crate) inbox: Option<Arc<dyn InboxHandler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subreddit_handler(mut self, handler: impl SubredditHandler + 'static) -> Self {
        self.subreddit = Some(Arc::new(handler));
        self
    }

    pub fn with_user_handler(mut self, handler: impl UserHandler + 'static) -> Self {
        self.user = Some(Arc::new(handler));
        self
    }

    pub fn with_inbox_handler(mut self, handler: impl InboxHandler + 'static) -> Self {
        self.inbox = Some(Arc::new(handler));
        self
    }
}
