//! # Store Queries
//!
//! Structured predicates handed to the store ports, plus the caller-facing
//! filter keys that map onto them.

use serde::{Deserialize, Serialize};

use crate::models::{QuestionId, UserId, TagId};
use crate::pagination::Window;

/// Orderings a question listing can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionOrder {
    NewestFirst,
    OldestFirst,
    MostVoted,
    MostViewed,
    MostAnswered,
    /// Store default; effectively insertion order
    Insertion,
    /// Views descending, then upvote count descending
    Hottest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionQuery {
    /// Case-insensitive substring over title or content
    pub search: Option<String>,
    /// Matches questions carrying at least one of these tags
    pub tagged_any: Option<Vec<TagId>>,
    pub author: Option<UserId>,
    pub exclude_author: Option<UserId>,
    /// Restricts to a user's saved questions
    pub saved_by: Option<UserId>,
    pub unanswered_only: bool,
    pub order: QuestionOrder,
    pub window: Window,
}

impl QuestionQuery {
    pub fn new(order: QuestionOrder, window: Window) -> Self {
        Self {
            search: None,
            tagged_any: None,
            author: None,
            exclude_author: None,
            saved_by: None,
            unanswered_only: false,
            order,
            window,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOrder {
    HighestUpvotes,
    LowestUpvotes,
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerQuery {
    pub question: Option<QuestionId>,
    pub author: Option<UserId>,
    /// Case-insensitive substring over content
    pub search: Option<String>,
    pub order: AnswerOrder,
    pub window: Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOrder {
    NewestFirst,
    OldestFirst,
    HighestReputation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    /// Case-insensitive substring over name or username
    pub search: Option<String>,
    pub order: UserOrder,
    pub window: Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOrder {
    MostQuestions,
    NewestFirst,
    OldestFirst,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    /// Case-insensitive substring over the tag name
    pub search: Option<String>,
    pub order: TagOrder,
    pub window: Window,
}

// ── Caller-facing filter keys ────────────────────────────────────────────────

/// Home page listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeFilter {
    #[default]
    Newest,
    Recommended,
    Frequent,
    Unanswered,
}

/// Saved-questions listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavedFilter {
    #[default]
    MostRecent,
    Oldest,
    MostVoted,
    MostViewed,
    MostAnswered,
}

impl SavedFilter {
    pub fn order(self) -> QuestionOrder {
        match self {
            SavedFilter::MostRecent => QuestionOrder::NewestFirst,
            SavedFilter::Oldest => QuestionOrder::OldestFirst,
            SavedFilter::MostVoted => QuestionOrder::MostVoted,
            SavedFilter::MostViewed => QuestionOrder::MostViewed,
            SavedFilter::MostAnswered => QuestionOrder::MostAnswered,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSort {
    HighestUpvotes,
    LowestUpvotes,
    #[default]
    Recent,
    Old,
}

impl AnswerSort {
    pub fn order(self) -> AnswerOrder {
        match self {
            AnswerSort::HighestUpvotes => AnswerOrder::HighestUpvotes,
            AnswerSort::LowestUpvotes => AnswerOrder::LowestUpvotes,
            AnswerSort::Recent => AnswerOrder::NewestFirst,
            AnswerSort::Old => AnswerOrder::OldestFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserFilter {
    #[default]
    NewUsers,
    OldUsers,
    TopContributors,
}

impl UserFilter {
    pub fn order(self) -> UserOrder {
        match self {
            UserFilter::NewUsers => UserOrder::NewestFirst,
            UserFilter::OldUsers => UserOrder::OldestFirst,
            UserFilter::TopContributors => UserOrder::HighestReputation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagFilter {
    #[default]
    Popular,
    Recent,
    Name,
    Old,
}

impl TagFilter {
    pub fn order(self) -> TagOrder {
        match self {
            TagFilter::Popular => TagOrder::MostQuestions,
            TagFilter::Recent => TagOrder::NewestFirst,
            TagFilter::Name => TagOrder::Name,
            TagFilter::Old => TagOrder::OldestFirst,
        }
    }
}

/// Entity kinds covered by global search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Question,
    Answer,
    User,
    Tag,
}
