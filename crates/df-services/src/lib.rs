//! # df-services
//!
//! Operations over the store ports: the vote engine, the reputation ledger,
//! tag resolution, recommendation, and the CRUD actions around them.
//!
//! Every operation runs as an independent unit of work. Multi-document
//! sequences (a vote plus two reputation increments, a question plus its
//! cascade) are issued as separate store updates with no wrapping
//! transaction, and failures are logged and returned unchanged.

use std::sync::Arc;

use df_core::traits::{AnswerRepo, InteractionRepo, QuestionRepo, TagRepo, UserRepo, VoteRepo};

pub mod answers;
pub mod questions;
pub mod recommend;
pub mod reputation;
pub mod search;
pub mod tags;
pub mod users;
pub mod vote;

pub use answers::AnswerService;
pub use questions::QuestionService;
pub use recommend::Recommender;
pub use reputation::{ReputationEvent, ReputationLedger};
pub use search::SearchService;
pub use tags::{TagResolver, TagService};
pub use users::UserService;
pub use vote::{VoteEngine, VoteTransition};

/// Handles to every store port, shared by all services.
#[derive(Clone)]
pub struct Repos {
    pub users: Arc<dyn UserRepo>,
    pub questions: Arc<dyn QuestionRepo>,
    pub answers: Arc<dyn AnswerRepo>,
    pub tags: Arc<dyn TagRepo>,
    pub votes: Arc<dyn VoteRepo>,
    pub interactions: Arc<dyn InteractionRepo>,
}

impl Repos {
    /// Uses one store implementation for every port.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepo + QuestionRepo + AnswerRepo + TagRepo + VoteRepo + InteractionRepo + 'static,
    {
        Self {
            users: store.clone(),
            questions: store.clone(),
            answers: store.clone(),
            tags: store.clone(),
            votes: store.clone(),
            interactions: store,
        }
    }
}

/// Every service, wired to the same store handles.
#[derive(Clone)]
pub struct Forum {
    pub votes: VoteEngine,
    pub questions: QuestionService,
    pub answers: AnswerService,
    pub users: UserService,
    pub tags: TagService,
    pub search: SearchService,
    pub recommender: Recommender,
}

impl Forum {
    pub fn new(repos: Repos) -> Self {
        Self {
            votes: VoteEngine::new(repos.clone()),
            questions: QuestionService::new(repos.clone()),
            answers: AnswerService::new(repos.clone()),
            users: UserService::new(repos.clone()),
            tags: TagService::new(repos.clone()),
            search: SearchService::new(repos.clone()),
            recommender: Recommender::new(repos),
        }
    }
}

/// Trims and rejects blank required text.
pub(crate) fn required(field: &str, value: String) -> df_core::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(df_core::AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Blank search text means no search at all.
pub(crate) fn search_text(search: Option<String>) -> Option<String> {
    search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
