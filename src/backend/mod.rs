//! Client seam for the hosted backend: authentication, table access and
//! realtime change notification.

mod local;

pub use local::LocalBackend;

use crate::models::{
    Comment, CommunityPost, JournalEntry, Message, NewComment, NewCommunityPost, NewJournalEntry,
    NewMessage, OAuthRedirect, PostWithComments, Profile, Session, User, UserStatus,
};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("user already registered")]
    AlreadyRegistered,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Row-level change pushed to subscribers after a successful write.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "table", content = "new", rename_all = "snake_case")]
pub enum ChangeEvent {
    Messages(Message),
    UserStatus(UserStatus),
    CommunityPosts(CommunityPost),
    Comments(Comment),
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, alias: &str)
    -> Result<User, BackendError>;
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError>;
    async fn sign_in_anonymously(&self) -> Result<Session, BackendError>;
    async fn sign_in_with_oauth(&self, provider: &str) -> Result<OAuthRedirect, BackendError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, BackendError>;

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError>;
    async fn profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>, BackendError>;

    async fn insert_journal_entry(
        &self,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, BackendError>;
    async fn journal_entries(
        &self,
        user_id: Uuid,
        order: SortOrder,
    ) -> Result<Vec<JournalEntry>, BackendError>;

    async fn insert_post(&self, post: NewCommunityPost) -> Result<CommunityPost, BackendError>;
    /// Newest posts first, each with its comments oldest first.
    async fn posts_with_comments(&self) -> Result<Vec<PostWithComments>, BackendError>;
    async fn like_post(&self, post_id: u64) -> Result<u64, BackendError>;
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, BackendError>;

    async fn upsert_status(&self, status: UserStatus) -> Result<(), BackendError>;
    async fn statuses(&self) -> Result<Vec<UserStatus>, BackendError>;

    async fn insert_message(&self, message: NewMessage) -> Result<Message, BackendError>;
    /// Messages exchanged between `a` and `b` in either direction, oldest first.
    async fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>, BackendError>;

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
