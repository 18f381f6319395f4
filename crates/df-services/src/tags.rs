//! # Tags
//!
//! `TagResolver` maps free-text names onto canonical Tag documents.
//! `TagService` serves the tag listings.

use std::collections::HashMap;
use std::sync::Arc;

use df_core::error::{AppError, Result};
use df_core::models::{Question, QuestionId, Tag, TagId, TagStat, UserId};
use df_core::pagination::{Page, PageRequest};
use df_core::query::{QuestionOrder, QuestionQuery, TagFilter, TagQuery};
use df_core::traits::TagRepo;
use tracing::{debug, instrument};

use crate::{search_text, Repos};

pub const POPULAR_TAG_LIMIT: u64 = 5;
pub const DEFAULT_TOP_INTERACTED: usize = 3;

#[derive(Clone)]
pub struct TagResolver {
    tags: Arc<dyn TagRepo>,
}

impl TagResolver {
    pub fn new(tags: Arc<dyn TagRepo>) -> Self {
        Self { tags }
    }

    /// Trims every name and rejects blank ones, so a question can be
    /// validated before anything is written.
    pub fn normalize(names: &[String]) -> Result<Vec<String>> {
        names
            .iter()
            .map(|name| {
                let name = name.trim();
                if name.is_empty() {
                    Err(AppError::Validation("tag names must not be empty".into()))
                } else {
                    Ok(name.to_string())
                }
            })
            .collect()
    }

    /// Finds or creates each tag case-insensitively and links `question`
    /// into its question list. Ids come back in the caller's order, one per
    /// name; two spellings of one tag yield the same id twice.
    ///
    /// The caller is responsible for linking the ids onto the question.
    pub async fn resolve_tags(&self, names: &[String], question: QuestionId) -> Result<Vec<TagId>> {
        let names = Self::normalize(names)?;
        let mut ids = Vec::with_capacity(names.len());
        for name in &names {
            let tag = self.tags.upsert_and_link(name, question).await?;
            debug!(tag = %tag.id, name = %tag.name, %question, "tag resolved");
            ids.push(tag.id);
        }
        Ok(ids)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetAllTagsParams {
    pub search: Option<String>,
    pub filter: TagFilter,
    pub page: PageRequest,
}

#[derive(Debug, Clone)]
pub struct GetQuestionsByTagParams {
    pub tag: TagId,
    pub search: Option<String>,
    pub page: PageRequest,
}

#[derive(Debug, Clone)]
pub struct GetTopInteractedTagsParams {
    pub user: UserId,
    pub limit: usize,
}

impl GetTopInteractedTagsParams {
    pub fn new(user: UserId) -> Self {
        Self { user, limit: DEFAULT_TOP_INTERACTED }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TaggedQuestions {
    pub tag: Tag,
    pub questions: Page<Question>,
}

#[derive(Clone)]
pub struct TagService {
    repos: Repos,
}

impl TagService {
    pub fn new(repos: Repos) -> Self {
        Self { repos }
    }

    #[instrument(skip(self), err)]
    pub async fn get_all_tags(&self, params: GetAllTagsParams) -> Result<Page<Tag>> {
        let window = params.page.window()?;
        let query = TagQuery {
            search: search_text(params.search),
            order: params.filter.order(),
            window,
        };
        let (tags, total) = self.repos.tags.find_tags(query).await?;
        Ok(Page::new(tags, total, window))
    }

    /// The tag plus a page of its questions, newest first.
    #[instrument(skip(self), err)]
    pub async fn get_questions_by_tag(&self, params: GetQuestionsByTagParams) -> Result<TaggedQuestions> {
        let window = params.page.window()?;
        let tag = self
            .repos
            .tags
            .find_tag(params.tag)
            .await?
            .ok_or_else(|| AppError::not_found("Tag", params.tag))?;

        let mut query = QuestionQuery::new(QuestionOrder::NewestFirst, window);
        query.tagged_any = Some(vec![tag.id]);
        query.search = search_text(params.search);
        let (questions, total) = self.repos.questions.find_questions(query).await?;

        Ok(TaggedQuestions { tag, questions: Page::new(questions, total, window) })
    }

    /// Top tags by question count.
    #[instrument(skip(self), err)]
    pub async fn get_popular_tags(&self) -> Result<Vec<TagStat>> {
        Ok(self.repos.tags.top_tags(POPULAR_TAG_LIMIT).await?)
    }

    /// The tags that appear most often across the user's interactions.
    /// Ties keep the order in which the tags were first met.
    #[instrument(skip(self), err)]
    pub async fn get_top_interacted_tags(&self, params: GetTopInteractedTagsParams) -> Result<Vec<Tag>> {
        self.repos
            .users
            .find_user(params.user)
            .await?
            .ok_or_else(|| AppError::not_found("User", params.user))?;

        let interactions = self.repos.interactions.interactions_for_user(params.user).await?;
        let mut counts: HashMap<TagId, (usize, usize)> = HashMap::new();
        for (seen, tag) in interactions.iter().flat_map(|i| i.tags.iter()).enumerate() {
            counts.entry(*tag).or_insert((0, seen)).0 += 1;
        }

        let mut ranked: Vec<(TagId, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_b.cmp(count_a).then(first_a.cmp(first_b))
        });
        let top: Vec<TagId> = ranked.into_iter().take(params.limit).map(|(id, _)| id).collect();
        if top.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.repos.tags.find_tags_by_ids(top).await?)
    }
}
