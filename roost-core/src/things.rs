use serde::Deserialize;

/// A submission to a subreddit.
///
/// Fields mirror the subset of the wire object the framework and typical
/// handlers need; everything else in the payload is ignored on decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Post {
    pub id: String,
    /// Fullname, e.g. `t3_abc123`. Stable and globally unique.
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub is_self: bool,
}

/// A comment, either on a watched user's page or as an inbox reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Fullname, e.g. `t1_abc123`.
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub subreddit: String,
    /// Fullname of the submission this comment belongs to. Absent on
    /// some inbox payloads.
    #[serde(default)]
    pub link_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
}

/// A private message from the logged-in account's inbox.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    pub id: String,
    /// Fullname, e.g. `t4_abc123`.
    pub name: String,
    /// Absent when the sender is a subreddit rather than a user.
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub was_comment: bool,
    #[serde(rename = "new", default)]
    pub unread: bool,
    #[serde(default)]
    pub created_utc: f64,
}

/// One element of a listing, discriminated by the wire `kind` tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum Thing {
    #[serde(rename = "t1")]
    Comment { data: Comment },
    #[serde(rename = "t3")]
    Post { data: Post },
    #[serde(rename = "t4")]
    Message { data: Message },
    /// Kinds the framework does not monitor (t2 accounts, t5 subreddits).
    #[serde(other)]
    Unknown,
}

impl Thing {
    /// Stable unique identifier of the wrapped item, e.g. `t3_abc123`.
    pub fn fullname(&self) -> Option<&str> {
        match self {
            Thing::Comment { data } => Some(&data.name),
            Thing::Post { data } => Some(&data.name),
            Thing::Message { data } => Some(&data.name),
            Thing::Unknown => None,
        }
    }

    /// Creation time in UTC seconds.
    pub fn created_utc(&self) -> Option<f64> {
        match self {
            Thing::Comment { data } => Some(data.created_utc),
            Thing::Post { data } => Some(data.created_utc),
            Thing::Message { data } => Some(data.created_utc),
            Thing::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_decodes_from_kind_tag() {
        let raw = r#"{
            "kind": "t3",
            "data": {
                "id": "abc123",
                "name": "t3_abc123",
                "title": "Test Post",
                "author": "test_user",
                "subreddit": "test",
                "selftext": "body",
                "permalink": "/r/test/comments/abc123",
                "url": "https://reddit.com/r/test/comments/abc123",
                "created_utc": 1640995200.0,
                "score": 42,
                "num_comments": 5,
                "is_self": true
            }
        }"#;

        let thing: Thing = serde_json::from_str(raw).unwrap();
        assert_eq!(thing.fullname(), Some("t3_abc123"));
        match thing {
            Thing::Post { data } => {
                assert_eq!(data.title, "Test Post");
                assert_eq!(data.score, 42);
                assert!(data.is_self);
                assert!(!data.over_18);
            }
            other => panic!("expected a post, got {other:?}"),
        }
    }

    #[test]
    fn comment_and_message_decode() {
        let comment: Thing = serde_json::from_str(
            r#"{"kind": "t1", "data": {"id": "c1", "name": "t1_c1", "body": "hi", "created_utc": 1.0}}"#,
        )
        .unwrap();
        assert_eq!(comment.fullname(), Some("t1_c1"));

        let message: Thing = serde_json::from_str(
            r#"{"kind": "t4", "data": {"id": "m1", "name": "t4_m1", "subject": "hey", "new": true, "created_utc": 2.0}}"#,
        )
        .unwrap();
        assert_eq!(message.fullname(), Some("t4_m1"));
        match message {
            Thing::Message { data } => {
                assert!(data.unread);
                assert_eq!(data.author, None);
            }
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_decodes_without_error() {
        let thing: Thing =
            serde_json::from_str(r#"{"kind": "t5", "data": {"display_name": "rust"}}"#).unwrap();
        assert!(matches!(thing, Thing::Unknown));
        assert_eq!(thing.fullname(), None);
        assert_eq!(thing.created_utc(), None);
    }
}
