//! # Recommendation Filter
//!
//! Questions sharing at least one tag with anything the user has interacted
//! with, minus the user's own. There is no ranking: every shared tag
//! qualifies equally and results come back in store order.

use std::collections::HashSet;

use df_core::error::{AppError, Result};
use df_core::models::{Question, TagId, UserId};
use df_core::pagination::{Page, PageRequest};
use df_core::query::{QuestionOrder, QuestionQuery};
use tracing::{debug, instrument};

use crate::{search_text, Repos};

#[derive(Debug, Clone)]
pub struct RecommendParams {
    pub user: UserId,
    pub page: PageRequest,
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct Recommender {
    repos: Repos,
}

impl Recommender {
    pub fn new(repos: Repos) -> Self {
        Self { repos }
    }

    #[instrument(skip(self), err)]
    pub async fn recommend(&self, params: RecommendParams) -> Result<Page<Question>> {
        let window = params.page.window()?;
        self.repos
            .users
            .find_user(params.user)
            .await?
            .ok_or_else(|| AppError::not_found("User", params.user))?;

        let tags = self.distinct_user_tags(params.user).await?;
        if tags.is_empty() {
            return Ok(Page::empty());
        }
        debug!(user = %params.user, tag_count = tags.len(), "recommending from interaction tags");

        let mut query = QuestionQuery::new(QuestionOrder::Insertion, window);
        query.tagged_any = Some(tags);
        query.exclude_author = Some(params.user);
        query.search = search_text(params.search);

        let (questions, total) = self.repos.questions.find_questions(query).await?;
        Ok(Page::new(questions, total, window))
    }

    /// Every tag snapshotted on the user's interactions, first occurrence kept.
    async fn distinct_user_tags(&self, user: UserId) -> Result<Vec<TagId>> {
        let interactions = self.repos.interactions.interactions_for_user(user).await?;
        let mut seen = HashSet::new();
        Ok(interactions
            .into_iter()
            .flat_map(|i| i.tags)
            .filter(|tag| seen.insert(*tag))
            .collect())
    }
}
