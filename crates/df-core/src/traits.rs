//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Every store method is a single logical update; callers sequence them.

use async_trait::async_trait;
#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::models::{
    Answer, AnswerId, Interaction, InteractionAction, NewUser, Question, QuestionId, Tag, TagId,
    TagStat, User, UserId, UserUpdate, VoteDirection, VoteTarget, VoteToggle,
};
use crate::query::{AnswerQuery, QuestionQuery, TagQuery, UserQuery};

/// Persistence contract for User documents and the reputation ledger they embed.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<User>;
    async fn find_user(&self, id: UserId) -> anyhow::Result<Option<User>>;
    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> anyhow::Result<Option<User>>;
    /// Returns `None` when no user carries this subject id.
    async fn update_user(&self, clerk_id: &str, update: UserUpdate) -> anyhow::Result<Option<User>>;
    async fn delete_user(&self, id: UserId) -> anyhow::Result<()>;
    async fn list_users(&self, query: UserQuery) -> anyhow::Result<(Vec<User>, u64)>;

    /// Atomic increment of the reputation field.
    async fn adjust_reputation(&self, id: UserId, delta: i64) -> anyhow::Result<()>;

    /// Add-to-set on the saved list.
    async fn save_question(&self, user: UserId, question: QuestionId) -> anyhow::Result<()>;
    /// Pull from the saved list.
    async fn unsave_question(&self, user: UserId, question: QuestionId) -> anyhow::Result<()>;
}

/// Persistence contract for Question documents.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait QuestionRepo: Send + Sync {
    async fn insert_question(&self, question: Question) -> anyhow::Result<()>;
    async fn find_question(&self, id: QuestionId) -> anyhow::Result<Option<Question>>;
    /// Returns the requested window and the total number of matches.
    async fn find_questions(&self, query: QuestionQuery) -> anyhow::Result<(Vec<Question>, u64)>;
    /// Appends tag ids to the question's tag list (set semantics).
    async fn link_tags(&self, id: QuestionId, tags: Vec<TagId>) -> anyhow::Result<()>;
    /// Rewrites title and content only. `None` when the question is gone.
    async fn update_question(&self, id: QuestionId, title: String, content: String) -> anyhow::Result<Option<Question>>;
    /// `false` when the question does not exist.
    async fn increment_views(&self, id: QuestionId) -> anyhow::Result<bool>;
    async fn delete_question(&self, id: QuestionId) -> anyhow::Result<()>;
}

/// Persistence contract for Answer documents.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AnswerRepo: Send + Sync {
    /// Inserting an answer also links it onto its question's answer list.
    async fn insert_answer(&self, answer: Answer) -> anyhow::Result<()>;
    async fn find_answer(&self, id: AnswerId) -> anyhow::Result<Option<Answer>>;
    async fn find_answers(&self, query: AnswerQuery) -> anyhow::Result<(Vec<Answer>, u64)>;
    /// Deleting an answer also unlinks it from its question.
    async fn delete_answer(&self, id: AnswerId) -> anyhow::Result<()>;
    /// Returns the ids that were removed.
    async fn delete_answers_for_question(&self, question: QuestionId) -> anyhow::Result<Vec<AnswerId>>;
}

/// Persistence contract for Tag documents.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TagRepo: Send + Sync {
    /// Atomic find-by-name (case-insensitive) or insert, then add-to-set of
    /// the question onto the tag's question list.
    async fn upsert_and_link(&self, name: &str, question: QuestionId) -> anyhow::Result<Tag>;
    async fn find_tag(&self, id: TagId) -> anyhow::Result<Option<Tag>>;
    /// Tags in the order of `ids`; unknown ids are skipped.
    async fn find_tags_by_ids(&self, ids: Vec<TagId>) -> anyhow::Result<Vec<Tag>>;
    async fn find_tags(&self, query: TagQuery) -> anyhow::Result<(Vec<Tag>, u64)>;
    /// Tags ranked by question count, descending.
    async fn top_tags(&self, limit: u64) -> anyhow::Result<Vec<TagStat>>;
    /// Pulls the question from every tag's question list.
    async fn unlink_question(&self, question: QuestionId) -> anyhow::Result<()>;
}

/// Two-sided vote sets on Questions and Answers.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait VoteRepo: Send + Sync {
    /// Toggles the voter's vote in `direction` as one atomic update on the
    /// target: the same vote again is withdrawn, anything else leaves the
    /// voter in exactly that set. The stored prior vote is read in the same
    /// update. `None` when the target does not exist.
    async fn apply_vote(&self, target: VoteTarget, voter: UserId, direction: VoteDirection) -> anyhow::Result<Option<VoteToggle>>;
}

/// Append-only interaction log.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait InteractionRepo: Send + Sync {
    async fn insert_interaction(&self, interaction: Interaction) -> anyhow::Result<()>;
    async fn has_interaction(&self, user: UserId, question: QuestionId, action: InteractionAction) -> anyhow::Result<bool>;
    /// All interactions of a user, oldest first.
    async fn interactions_for_user(&self, user: UserId) -> anyhow::Result<Vec<Interaction>>;
    async fn delete_for_question(&self, question: QuestionId) -> anyhow::Result<u64>;
    async fn delete_for_answer(&self, answer: AnswerId) -> anyhow::Result<u64>;
    async fn delete_for_user(&self, user: UserId) -> anyhow::Result<u64>;
}

/// Headers the identity provider signs its webhooks with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

/// User lifecycle change announced by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityEvent {
    UserCreated(NewUser),
    UserUpdated { clerk_id: String, update: UserUpdate },
    UserDeleted { clerk_id: String },
    /// Any event type this core does not act on
    Ignored(String),
}

/// Identity contract. Credentials never reach this core; only the
/// provider's opaque subject id and its signed lifecycle events do.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait IdentityProvider: Send + Sync {
    /// Verifies the signature and decodes the event.
    fn verify_webhook(&self, headers: &WebhookHeaders, body: &[u8]) -> anyhow::Result<IdentityEvent>;
}
