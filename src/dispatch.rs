use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use roost_core::Thing;

use crate::handlers::{InboxHandler, SubredditHandler, UserHandler};

/// Routes a listing item to the right handler method for one role.
///
/// Items of a kind the role does not carry (a stray comment in a
/// subreddit feed, say) are dropped silently; the stream's cursor still
/// moves past them.
#[async_trait]
pub(crate) trait Dispatch: Send + Sync {
    async fn dispatch(&self, thing: Thing) -> anyhow::Result<()>;
}

pub(crate) struct SubredditDispatch(pub Arc<dyn SubredditHandler>);

#[async_trait]
impl Dispatch for SubredditDispatch {
    async fn dispatch(&self, thing: Thing) -> anyhow::Result<()> {
        match thing {
            Thing::Post { data } => self.0.handle_post(data).await,
            _ => {
                debug!("ignoring non-post item in a subreddit feed");
                Ok(())
            }
        }
    }
}

pub(crate) struct UserDispatch(pub Arc<dyn UserHandler>);

#[async_trait]
impl Dispatch for UserDispatch {
    async fn dispatch(&self, thing: Thing) -> anyhow::Result<()> {
        match thing {
            Thing::Post { data } => self.0.handle_post(data).await,
            Thing::Comment { data } => self.0.handle_comment(data).await,
            _ => Ok(()),
        }
    }
}

pub(crate) struct InboxDispatch(pub Arc<dyn InboxHandler>);

#[async_trait]
impl Dispatch for InboxDispatch {
    async fn dispatch(&self, thing: Thing) -> anyhow::Result<()> {
        match thing {
            Thing::Message { data } => self.0.handle_message(data).await,
            Thing::Comment { data } => self.0.handle_comment_reply(data).await,
            _ => Ok(()),
        }
    }
}

/// Stand-in for roles the caller subscribed to without registering a
/// handler.
pub(crate) struct NoopDispatch;

#[async_trait]
impl Dispatch for NoopDispatch {
    async fn dispatch(&self, _thing: Thing) -> anyhow::Result<()> {
        Ok(())
    }
}
