use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mood code in `1..=5`, from "Awful" to "Great".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Mood(u8);

impl Mood {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Option<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn emoji(self) -> &'static str {
        match self.0 {
            1 => "😔",
            2 => "😟",
            3 => "😐",
            4 => "😊",
            _ => "😄",
        }
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Awful",
            2 => "Bad",
            3 => "Okay",
            4 => "Good",
            _ => "Great",
        }
    }

    pub fn all() -> impl Iterator<Item = Mood> {
        (Self::MIN..=Self::MAX).map(Mood)
    }
}

impl TryFrom<i64> for Mood {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Mood::new(value).ok_or_else(|| format!("mood must be between 1 and 5, got {value}"))
    }
}

impl From<Mood> for u8 {
    fn from(mood: Mood) -> Self {
        mood.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub alias: Option<String>,
}

impl Profile {
    /// Posting name, falling back to "Anonymous" when no alias was chosen.
    pub fn display_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| ANONYMOUS.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        is_anonymous_alias(self.alias.as_deref())
    }
}

pub const ANONYMOUS: &str = "Anonymous";

pub fn is_anonymous_alias(alias: Option<&str>) -> bool {
    match alias {
        None => true,
        Some(alias) => alias.is_empty() || alias.starts_with(ANONYMOUS),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthRedirect {
    pub provider: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub mood: Mood,
    pub content: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub user_id: Uuid,
    pub mood: Mood,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub author_name: String,
    pub is_anonymous: bool,
    pub user_id: Uuid,
    #[serde(default)]
    pub likes_count: u64,
}

#[derive(Debug, Clone)]
pub struct NewCommunityPost {
    pub user_id: Uuid,
    pub content: String,
    pub author_name: String,
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub author_name: String,
    pub post_id: u64,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: u64,
    pub user_id: Uuid,
    pub content: String,
    pub author_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: CommunityPost,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatus {
    pub user_id: Uuid,
    pub online: bool,
    pub last_active: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// True when the message was exchanged between `a` and `b`, in either direction.
    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
}

// Request bodies

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub alias: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct NewEntryRequest {
    pub content: String,
    pub mood: i64,
}

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct PresenceRequest {
    pub online: bool,
}

#[derive(Debug, Deserialize)]
pub struct PredictSentimentRequest {
    pub text: String,
}

// Response bodies

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub alias: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub success: bool,
    pub new_likes: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: Uuid,
    pub alias: String,
    pub online: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub sentiment: f64,
}

#[derive(Debug, Serialize)]
pub struct MoodChartPoint {
    pub date: String,
    pub mood: Mood,
}

#[derive(Debug, Serialize)]
pub struct MoodBadge {
    pub value: Mood,
    pub emoji: &'static str,
    pub label: &'static str,
}

impl From<Mood> for MoodBadge {
    fn from(mood: Mood) -> Self {
        Self {
            value: mood,
            emoji: mood.emoji(),
            label: mood.label(),
        }
    }
}
