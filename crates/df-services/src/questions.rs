//! # Questions
//!
//! Asking, listing, editing, viewing, and deleting questions.

use df_core::error::{AppError, Result};
use df_core::models::{Interaction, InteractionAction, Question, QuestionId, UserId};
use df_core::pagination::{Page, PageRequest, Window};
use df_core::query::{HomeFilter, QuestionOrder, QuestionQuery};
use chrono::Utc;
use tracing::{info, instrument};

use crate::recommend::{RecommendParams, Recommender};
use crate::reputation::{ReputationEvent, ReputationLedger};
use crate::tags::TagResolver;
use crate::{required, search_text, Repos};

pub const HOT_QUESTION_LIMIT: u64 = 5;

#[derive(Debug, Clone)]
pub struct CreateQuestionParams {
    pub title: String,
    pub content: String,
    pub author: UserId,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetQuestionsParams {
    pub search: Option<String>,
    pub filter: HomeFilter,
    pub page: PageRequest,
    /// Signed-in user, needed for the recommended listing
    pub viewer: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct EditQuestionParams {
    pub question: QuestionId,
    pub editor: UserId,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct DeleteQuestionParams {
    pub question: QuestionId,
    pub actor: UserId,
}

#[derive(Debug, Clone)]
pub struct ViewQuestionParams {
    pub question: QuestionId,
    pub viewer: Option<UserId>,
}

#[derive(Clone)]
pub struct QuestionService {
    repos: Repos,
    resolver: TagResolver,
    ledger: ReputationLedger,
    recommender: Recommender,
}

impl QuestionService {
    pub fn new(repos: Repos) -> Self {
        Self {
            resolver: TagResolver::new(repos.tags.clone()),
            ledger: ReputationLedger::new(repos.users.clone()),
            recommender: Recommender::new(repos.clone()),
            repos,
        }
    }

    #[instrument(skip(self), fields(author = %params.author), err)]
    pub async fn create_question(&self, params: CreateQuestionParams) -> Result<Question> {
        let title = required("title", params.title)?;
        let content = required("content", params.content)?;
        let tag_names = TagResolver::normalize(&params.tags)?;
        self.repos
            .users
            .find_user(params.author)
            .await?
            .ok_or_else(|| AppError::not_found("User", params.author))?;

        let mut question = Question {
            id: QuestionId::generate(),
            title,
            content,
            author: params.author,
            tags: Vec::new(),
            upvotes: Vec::new(),
            downvotes: Vec::new(),
            views: 0,
            answers: Vec::new(),
            created_at: Utc::now(),
        };
        self.repos.questions.insert_question(question.clone()).await?;

        let tag_ids = self.resolver.resolve_tags(&tag_names, question.id).await?;
        self.repos.questions.link_tags(question.id, tag_ids.clone()).await?;
        for id in tag_ids {
            if !question.tags.contains(&id) {
                question.tags.push(id);
            }
        }

        let interaction = Interaction::record(params.author, InteractionAction::AskQuestion).on_question(&question);
        self.repos.interactions.insert_interaction(interaction).await?;
        self.ledger.record(params.author, ReputationEvent::AskedQuestion).await?;

        info!(question = %question.id, tags = question.tags.len(), "question created");
        Ok(question)
    }

    /// Home page listing.
    #[instrument(skip(self), err)]
    pub async fn get_questions(&self, params: GetQuestionsParams) -> Result<Page<Question>> {
        let window = params.page.window()?;
        let order = match params.filter {
            HomeFilter::Recommended => {
                return match params.viewer {
                    Some(user) => {
                        self.recommender
                            .recommend(RecommendParams { user, page: params.page, search: params.search })
                            .await
                    }
                    None => Ok(Page::empty()),
                };
            }
            HomeFilter::Newest | HomeFilter::Unanswered => QuestionOrder::NewestFirst,
            HomeFilter::Frequent => QuestionOrder::MostViewed,
        };

        let mut query = QuestionQuery::new(order, window);
        query.search = search_text(params.search);
        query.unanswered_only = params.filter == HomeFilter::Unanswered;
        let (questions, total) = self.repos.questions.find_questions(query).await?;
        Ok(Page::new(questions, total, window))
    }

    #[instrument(skip(self), err)]
    pub async fn get_question(&self, id: QuestionId) -> Result<Question> {
        self.repos
            .questions
            .find_question(id)
            .await?
            .ok_or_else(|| AppError::not_found("Question", id))
    }

    /// Only title and content are editable, and only by the author.
    #[instrument(skip(self), fields(question = %params.question), err)]
    pub async fn edit_question(&self, params: EditQuestionParams) -> Result<Question> {
        let title = required("title", params.title)?;
        let content = required("content", params.content)?;
        let question = self.get_question(params.question).await?;
        if question.author != params.editor {
            return Err(AppError::Unauthorized("only the author can edit a question".into()));
        }

        self.repos
            .questions
            .update_question(question.id, title, content)
            .await?
            .ok_or_else(|| AppError::not_found("Question", question.id))
    }

    /// Removes the question with its answers and interactions, unlinks it
    /// from every tag, and debits the author.
    #[instrument(skip(self), fields(question = %params.question), err)]
    pub async fn delete_question(&self, params: DeleteQuestionParams) -> Result<()> {
        let question = self.get_question(params.question).await?;
        if question.author != params.actor {
            return Err(AppError::Unauthorized("only the author can delete a question".into()));
        }

        self.cascade_delete(&question).await?;
        self.ledger.record(question.author, ReputationEvent::DeletedQuestion).await?;
        info!(question = %question.id, "question deleted");
        Ok(())
    }

    /// Each step is its own store update; a failure part-way leaves the
    /// earlier steps applied.
    pub(crate) async fn cascade_delete(&self, question: &Question) -> Result<()> {
        let answers = self.repos.answers.delete_answers_for_question(question.id).await?;
        for answer in &answers {
            self.repos.interactions.delete_for_answer(*answer).await?;
        }
        let interactions = self.repos.interactions.delete_for_question(question.id).await?;
        self.repos.tags.unlink_question(question.id).await?;
        self.repos.questions.delete_question(question.id).await?;
        info!(question = %question.id, answers = answers.len(), interactions, "question cascade removed");
        Ok(())
    }

    /// Counts a view, and logs the first view by each signed-in user.
    #[instrument(skip(self), err)]
    pub async fn view_question(&self, params: ViewQuestionParams) -> Result<()> {
        if !self.repos.questions.increment_views(params.question).await? {
            return Err(AppError::not_found("Question", params.question));
        }
        let Some(viewer) = params.viewer else {
            return Ok(());
        };
        if self
            .repos
            .interactions
            .has_interaction(viewer, params.question, InteractionAction::View)
            .await?
        {
            return Ok(());
        }

        let question = self.get_question(params.question).await?;
        let interaction = Interaction::record(viewer, InteractionAction::View).on_question(&question);
        self.repos.interactions.insert_interaction(interaction).await?;
        Ok(())
    }

    /// Most viewed, then most upvoted.
    #[instrument(skip(self), err)]
    pub async fn hot_questions(&self) -> Result<Vec<Question>> {
        let query = QuestionQuery::new(QuestionOrder::Hottest, Window { skip: 0, limit: HOT_QUESTION_LIMIT });
        let (questions, _) = self.repos.questions.find_questions(query).await?;
        Ok(questions)
    }
}
