use crate::error::PlatformError;
use std::future::Future;
use std::pin::Pin;

pub type PlatformFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, PlatformError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    /// Community or board the post lands in.
    pub category: String,
}

/// Math challenge some platforms attach to new content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationChallenge {
    pub code: String,
    pub challenge: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedItem {
    pub id: String,
    pub url: Option<String>,
    pub verification: Option<VerificationChallenge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
}

/// The slice of a social platform's API the agent needs.
pub trait Platform: Send + Sync {
    fn name(&self) -> &str;

    fn create_post<'a>(&'a self, draft: &'a PostDraft) -> PlatformFuture<'a, CreatedItem>;

    fn create_comment<'a>(&'a self, post_id: &'a str, body: &'a str)
    -> PlatformFuture<'a, CreatedItem>;

    fn list_posts<'a>(&'a self, sort: &'a str, limit: u32) -> PlatformFuture<'a, Vec<FeedItem>>;

    fn submit_verification<'a>(&'a self, code: &'a str, answer: &'a str)
    -> PlatformFuture<'a, ()>;
}
