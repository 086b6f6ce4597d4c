use super::{Backend, BackendError, ChangeEvent, SortOrder};
use crate::models::{
    Comment, CommunityPost, JournalEntry, Message, NewComment, NewCommunityPost, NewJournalEntry,
    NewMessage, OAuthRedirect, PostWithComments, Profile, Session, User, UserStatus,
};
use crate::storage::{load_data, persist_data, BackendData, UserRecord};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info};
use uuid::Uuid;

const CHANGE_FEED_CAPACITY: usize = 256;

/// File-backed stand-in for the hosted backend.
///
/// All tables live in one JSON document guarded by a mutex; every write
/// persists the whole document before notifying subscribers. A failed write
/// leaves the in-memory change in place.
#[derive(Clone)]
pub struct LocalBackend {
    path: PathBuf,
    data: Arc<Mutex<BackendData>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl LocalBackend {
    /// Opens the document at `path`, refusing to start over an unreadable one.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let data = load_data(&path).await?;
        info!(
            "local backend loaded {} users, {} entries from {}",
            data.users.len(),
            data.journal_entries.len(),
            path.display()
        );
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Ok(Self {
            path,
            data: Arc::new(Mutex::new(data)),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn commit(&self, data: &BackendData) -> Result<(), BackendError> {
        persist_data(&self.path, data).await.map_err(|err| {
            error!("failed to persist {}: {err}", self.path.display());
            BackendError::from(err)
        })
    }

    fn publish(&self, event: ChangeEvent) {
        // No subscribers is not an error.
        let _ = self.changes.send(event);
    }

    fn open_session(data: &mut BackendData, user_id: Uuid) -> Session {
        let access_token = Uuid::new_v4().simple().to_string();
        data.sessions.insert(access_token.clone(), user_id);
        Session {
            access_token,
            user_id,
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, BackendError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| BackendError::Storage(format!("password hashing failed: {err}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn to_user(record: &UserRecord) -> User {
    User {
        id: record.id,
        email: record.email.clone(),
        is_anonymous: record.is_anonymous,
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        alias: &str,
    ) -> Result<User, BackendError> {
        let email = normalize_email(email);
        let password_hash = hash_password(password)?;

        let mut data = self.data.lock().await;
        if data
            .users
            .iter()
            .any(|user| user.email.as_deref() == Some(email.as_str()))
        {
            return Err(BackendError::AlreadyRegistered);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            email: Some(email),
            password_hash: Some(password_hash),
            is_anonymous: false,
        };
        let alias = alias.trim();
        data.profiles.insert(
            record.id,
            Profile {
                id: record.id,
                alias: (!alias.is_empty()).then(|| alias.to_string()),
            },
        );
        let user = to_user(&record);
        data.users.push(record);
        self.commit(&data).await?;

        debug!(user_id = %user.id, "user signed up");
        Ok(user)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let email = normalize_email(email);
        let (user_id, password_hash) = {
            let data = self.data.lock().await;
            data.users
                .iter()
                .find(|user| user.email.as_deref() == Some(email.as_str()))
                .and_then(|user| Some((user.id, user.password_hash.clone()?)))
                .ok_or(BackendError::InvalidCredentials)?
        };

        // Verified without holding the document lock.
        if !verify_password(password, &password_hash) {
            return Err(BackendError::InvalidCredentials);
        }

        let mut data = self.data.lock().await;
        if !data.users.iter().any(|user| user.id == user_id) {
            return Err(BackendError::InvalidCredentials);
        }
        let session = Self::open_session(&mut data, user_id);
        self.commit(&data).await?;
        Ok(session)
    }

    async fn sign_in_anonymously(&self) -> Result<Session, BackendError> {
        let mut data = self.data.lock().await;
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: None,
            password_hash: None,
            is_anonymous: true,
        };
        data.profiles.insert(
            record.id,
            Profile {
                id: record.id,
                alias: None,
            },
        );
        let user_id = record.id;
        data.users.push(record);
        let session = Self::open_session(&mut data, user_id);
        self.commit(&data).await?;

        debug!(%user_id, "anonymous sign-in");
        Ok(session)
    }

    async fn sign_in_with_oauth(&self, _provider: &str) -> Result<OAuthRedirect, BackendError> {
        Err(BackendError::Unsupported("oauth sign-in"))
    }

    /// Anonymous accounts cannot sign in again, so their last sign-out also
    /// drops the user, profile and presence rows.
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let mut data = self.data.lock().await;
        let Some(user_id) = data.sessions.remove(access_token) else {
            return Ok(());
        };

        let anonymous = data
            .users
            .iter()
            .any(|user| user.id == user_id && user.is_anonymous);
        if anonymous && !data.sessions.values().any(|id| *id == user_id) {
            data.users.retain(|user| user.id != user_id);
            data.profiles.remove(&user_id);
            data.user_status.remove(&user_id);
            debug!(%user_id, "anonymous account removed on sign-out");
        }
        self.commit(&data).await
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, BackendError> {
        let data = self.data.lock().await;
        let Some(user_id) = data.sessions.get(access_token) else {
            return Ok(None);
        };
        Ok(data
            .users
            .iter()
            .find(|user| user.id == *user_id)
            .map(to_user))
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError> {
        let data = self.data.lock().await;
        Ok(data.profiles.get(&user_id).cloned())
    }

    async fn profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>, BackendError> {
        let data = self.data.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| data.profiles.get(id).cloned())
            .collect())
    }

    async fn insert_journal_entry(
        &self,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, BackendError> {
        let mut data = self.data.lock().await;
        let entry = JournalEntry {
            id: data.allocate_id(),
            created_at: Utc::now(),
            mood: entry.mood,
            content: entry.content,
            user_id: entry.user_id,
        };
        data.journal_entries.push(entry.clone());
        self.commit(&data).await?;
        Ok(entry)
    }

    async fn journal_entries(
        &self,
        user_id: Uuid,
        order: SortOrder,
    ) -> Result<Vec<JournalEntry>, BackendError> {
        let data = self.data.lock().await;
        let mut entries: Vec<JournalEntry> = data
            .journal_entries
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.created_at, entry.id));
        if order == SortOrder::Descending {
            entries.reverse();
        }
        Ok(entries)
    }

    async fn insert_post(&self, post: NewCommunityPost) -> Result<CommunityPost, BackendError> {
        let mut data = self.data.lock().await;
        let post = CommunityPost {
            id: data.allocate_id(),
            created_at: Utc::now(),
            content: post.content,
            author_name: post.author_name,
            is_anonymous: post.is_anonymous,
            user_id: post.user_id,
            likes_count: 0,
        };
        data.community_posts.push(post.clone());
        self.commit(&data).await?;
        self.publish(ChangeEvent::CommunityPosts(post.clone()));
        Ok(post)
    }

    async fn posts_with_comments(&self) -> Result<Vec<PostWithComments>, BackendError> {
        let data = self.data.lock().await;
        let mut posts: Vec<PostWithComments> = data
            .community_posts
            .iter()
            .map(|post| {
                let mut comments: Vec<Comment> = data
                    .comments
                    .iter()
                    .filter(|comment| comment.post_id == post.id)
                    .cloned()
                    .collect();
                comments.sort_by_key(|comment| (comment.created_at, comment.id));
                PostWithComments {
                    post: post.clone(),
                    comments,
                }
            })
            .collect();
        posts.sort_by(|a, b| {
            (b.post.created_at, b.post.id).cmp(&(a.post.created_at, a.post.id))
        });
        Ok(posts)
    }

    async fn like_post(&self, post_id: u64) -> Result<u64, BackendError> {
        let mut data = self.data.lock().await;
        let likes = {
            let post = data
                .community_posts
                .iter_mut()
                .find(|post| post.id == post_id)
                .ok_or(BackendError::NotFound("post"))?;
            post.likes_count = post.likes_count.saturating_add(1);
            post.likes_count
        };
        self.commit(&data).await?;
        Ok(likes)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, BackendError> {
        let mut data = self.data.lock().await;
        if !data
            .community_posts
            .iter()
            .any(|post| post.id == comment.post_id)
        {
            return Err(BackendError::NotFound("post"));
        }
        let comment = Comment {
            id: data.allocate_id(),
            created_at: Utc::now(),
            content: comment.content,
            author_name: comment.author_name,
            post_id: comment.post_id,
            user_id: comment.user_id,
        };
        data.comments.push(comment.clone());
        self.commit(&data).await?;
        self.publish(ChangeEvent::Comments(comment.clone()));
        Ok(comment)
    }

    async fn upsert_status(&self, status: UserStatus) -> Result<(), BackendError> {
        let mut data = self.data.lock().await;
        data.user_status.insert(status.user_id, status.clone());
        self.commit(&data).await?;
        self.publish(ChangeEvent::UserStatus(status));
        Ok(())
    }

    async fn statuses(&self) -> Result<Vec<UserStatus>, BackendError> {
        let data = self.data.lock().await;
        Ok(data.user_status.values().cloned().collect())
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message, BackendError> {
        let mut data = self.data.lock().await;
        let message = Message {
            id: data.allocate_id(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            created_at: Utc::now(),
        };
        data.messages.push(message.clone());
        self.commit(&data).await?;
        self.publish(ChangeEvent::Messages(message.clone()));
        Ok(message)
    }

    async fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>, BackendError> {
        let data = self.data.lock().await;
        let mut messages: Vec<Message> = data
            .messages
            .iter()
            .filter(|message| message.is_between(a, b))
            .cloned()
            .collect();
        messages.sort_by_key(|message| (message.created_at, message.id));
        Ok(messages)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
