//! # Global Search
//!
//! One search box across questions, answers, users, and tags.

use df_core::error::Result;
use df_core::pagination::Window;
use df_core::query::{AnswerOrder, AnswerQuery, QuestionOrder, QuestionQuery, SearchKind, TagOrder, TagQuery, UserOrder, UserQuery};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{search_text, Repos};

/// Hits per kind when searching everything.
pub const MIXED_LIMIT: u64 = 2;
/// Hits when searching a single kind.
pub const SINGLE_KIND_LIMIT: u64 = 8;

#[derive(Debug, Clone)]
pub struct GlobalSearchParams {
    pub query: Option<String>,
    pub kind: Option<SearchKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub kind: SearchKind,
    /// Question id for question and answer hits, otherwise the entity's own id
    pub id: Uuid,
    pub title: String,
}

#[derive(Clone)]
pub struct SearchService {
    repos: Repos,
}

impl SearchService {
    pub fn new(repos: Repos) -> Self {
        Self { repos }
    }

    #[instrument(skip(self), err)]
    pub async fn global_search(&self, params: GlobalSearchParams) -> Result<Vec<SearchHit>> {
        let Some(text) = search_text(params.query) else {
            return Ok(Vec::new());
        };

        let (kinds, limit) = match params.kind {
            Some(kind) => (vec![kind], SINGLE_KIND_LIMIT),
            None => (
                vec![SearchKind::Question, SearchKind::Answer, SearchKind::User, SearchKind::Tag],
                MIXED_LIMIT,
            ),
        };
        let window = Window { skip: 0, limit };

        let mut hits = Vec::new();
        for kind in kinds {
            match kind {
                SearchKind::Question => {
                    let mut query = QuestionQuery::new(QuestionOrder::NewestFirst, window);
                    query.search = Some(text.clone());
                    let (questions, _) = self.repos.questions.find_questions(query).await?;
                    hits.extend(questions.into_iter().map(|q| SearchHit { kind, id: q.id.0, title: q.title }));
                }
                SearchKind::Answer => {
                    let query = AnswerQuery {
                        question: None,
                        author: None,
                        search: Some(text.clone()),
                        order: AnswerOrder::NewestFirst,
                        window,
                    };
                    let (answers, _) = self.repos.answers.find_answers(query).await?;
                    hits.extend(answers.into_iter().map(|a| SearchHit {
                        kind,
                        id: a.question.0,
                        title: format!("Answers containing {text}"),
                    }));
                }
                SearchKind::User => {
                    let query = UserQuery { search: Some(text.clone()), order: UserOrder::NewestFirst, window };
                    let (users, _) = self.repos.users.list_users(query).await?;
                    hits.extend(users.into_iter().map(|u| SearchHit { kind, id: u.id.0, title: u.name }));
                }
                SearchKind::Tag => {
                    let query = TagQuery { search: Some(text.clone()), order: TagOrder::Name, window };
                    let (tags, _) = self.repos.tags.find_tags(query).await?;
                    hits.extend(tags.into_iter().map(|t| SearchHit { kind, id: t.id.0, title: t.name }));
                }
            }
        }
        Ok(hits)
    }
}
