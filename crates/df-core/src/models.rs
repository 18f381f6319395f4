//! # Domain Models
//!
//! These structs represent the core entities of DevFlow.
//! We use UUID v7 for time-ordered, globally unique identification, wrapped
//! in one newtype per entity so ids cannot be mixed up across collections.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Internal key of a User document (not the identity provider's subject id)
    UserId
);
entity_id!(QuestionId);
entity_id!(AnswerId);
entity_id!(TagId);
entity_id!(InteractionId);

/// A registered member. Created on first sign-in through the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Opaque subject id issued by the identity provider
    pub clerk_id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub portfolio_website: Option<String>,
    pub picture: String,
    /// Adjusted only through reputation deltas; may go negative
    pub reputation: i64,
    /// Bookmarked questions, in the order they were saved
    pub saved: Vec<QuestionId>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub clerk_id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub portfolio_website: Option<String>,
    pub picture: String,
}

/// Profile edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub portfolio_website: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// A question thread. The author never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    /// Rich-text body, stored as submitted
    pub content: String,
    pub author: UserId,
    pub tags: Vec<TagId>,
    pub upvotes: Vec<UserId>,
    pub downvotes: Vec<UserId>,
    /// Monotonic view counter
    pub views: u64,
    pub answers: Vec<AnswerId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub content: String,
    pub author: UserId,
    pub question: QuestionId,
    pub upvotes: Vec<UserId>,
    pub downvotes: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Canonical tag. Names are unique case-insensitively; the first spelling wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub questions: Vec<QuestionId>,
    pub created_at: DateTime<Utc>,
}

/// A tag together with the size of its question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagStat {
    pub id: TagId,
    pub name: String,
    pub question_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAction {
    View,
    Answer,
    AskQuestion,
    Upvote,
    Downvote,
}

impl InteractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionAction::View => "view",
            InteractionAction::Answer => "answer",
            InteractionAction::AskQuestion => "ask_question",
            InteractionAction::Upvote => "upvote",
            InteractionAction::Downvote => "downvote",
        }
    }
}

impl FromStr for InteractionAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(InteractionAction::View),
            "answer" => Ok(InteractionAction::Answer),
            "ask_question" => Ok(InteractionAction::AskQuestion),
            "upvote" => Ok(InteractionAction::Upvote),
            "downvote" => Ok(InteractionAction::Downvote),
            other => Err(AppError::Validation(format!("unknown interaction action '{other}'"))),
        }
    }
}

/// Append-only log entry feeding the recommendation filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub user: UserId,
    pub action: InteractionAction,
    pub question: Option<QuestionId>,
    pub answer: Option<AnswerId>,
    /// Tags of the related question at the time of the action
    pub tags: Vec<TagId>,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    pub fn record(user: UserId, action: InteractionAction) -> Self {
        Self {
            id: InteractionId::generate(),
            user,
            action,
            question: None,
            answer: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn on_question(mut self, question: &Question) -> Self {
        self.question = Some(question.id);
        self.tags = question.tags.clone();
        self
    }

    pub fn on_answer(mut self, answer: AnswerId) -> Self {
        self.answer = Some(answer);
        self
    }
}

// ── Votes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn opposite(self) -> Self {
        match self {
            VoteDirection::Up => VoteDirection::Down,
            VoteDirection::Down => VoteDirection::Up,
        }
    }
}

/// The document whose vote sets are being changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VoteTarget {
    Question(QuestionId),
    Answer(AnswerId),
}

impl VoteTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            VoteTarget::Question(_) => "Question",
            VoteTarget::Answer(_) => "Answer",
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        match self {
            VoteTarget::Question(id) => id.0,
            VoteTarget::Answer(id) => id.0,
        }
    }
}


/// Vote sets of a target after an update, plus who authored it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    pub author: UserId,
    pub upvotes: Vec<UserId>,
    pub downvotes: Vec<UserId>,
}

/// Outcome of toggling one voter's vote, with the vote they held before.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteToggle {
    pub prior: Option<VoteDirection>,
    pub tally: VoteTally,
}
