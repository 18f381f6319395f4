//! # Users
//!
//! Profiles, saved questions, and per-user listings.

use df_core::error::{AppError, Result};
use df_core::models::{Answer, NewUser, Question, QuestionId, User, UserId, UserUpdate};
use df_core::pagination::{Page, PageRequest, Window};
use df_core::query::{AnswerOrder, AnswerQuery, QuestionOrder, QuestionQuery, SavedFilter, UserFilter, UserQuery};
use serde::Serialize;
use tracing::{info, instrument};

use crate::questions::QuestionService;
use crate::{required, search_text, Repos};

pub const PROFILE_PAGE_SIZE: u32 = 5;
const CASCADE_BATCH: u64 = 100;

#[derive(Debug, Clone)]
pub struct UpdateUserParams {
    pub clerk_id: String,
    pub update: UserUpdate,
}

#[derive(Debug, Clone, Default)]
pub struct GetAllUsersParams {
    pub search: Option<String>,
    pub filter: UserFilter,
    pub page: PageRequest,
}

#[derive(Debug, Clone)]
pub struct ToggleSaveQuestionParams {
    pub user: UserId,
    pub question: QuestionId,
}

#[derive(Debug, Clone)]
pub struct GetSavedQuestionsParams {
    pub clerk_id: String,
    pub search: Option<String>,
    pub filter: SavedFilter,
    pub page: PageRequest,
}

#[derive(Debug, Clone)]
pub struct GetUserStatsParams {
    pub user: UserId,
    pub page: PageRequest,
}

impl GetUserStatsParams {
    pub fn new(user: UserId) -> Self {
        Self { user, page: PageRequest::new(1, PROFILE_PAGE_SIZE) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub user: User,
    pub total_questions: u64,
    pub total_answers: u64,
}

#[derive(Clone)]
pub struct UserService {
    repos: Repos,
    questions: QuestionService,
}

impl UserService {
    pub fn new(repos: Repos) -> Self {
        Self { questions: QuestionService::new(repos.clone()), repos }
    }

    #[instrument(skip(self), fields(clerk_id = %user.clerk_id), err)]
    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = NewUser {
            clerk_id: required("clerk_id", user.clerk_id)?,
            username: required("username", user.username)?,
            email: required("email", user.email)?,
            ..user
        };
        let created = self.repos.users.insert_user(user).await?;
        info!(user = %created.id, "user created");
        Ok(created)
    }

    #[instrument(skip(self), err)]
    pub async fn get_user_by_clerk_id(&self, clerk_id: &str) -> Result<User> {
        self.repos
            .users
            .find_user_by_clerk_id(clerk_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", clerk_id))
    }

    #[instrument(skip(self), err)]
    pub async fn get_user(&self, id: UserId) -> Result<User> {
        self.repos
            .users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    #[instrument(skip(self), fields(clerk_id = %params.clerk_id), err)]
    pub async fn update_user(&self, params: UpdateUserParams) -> Result<User> {
        self.repos
            .users
            .update_user(&params.clerk_id, params.update)
            .await?
            .ok_or_else(|| AppError::not_found("User", &params.clerk_id))
    }

    /// Removes every question the user authored (with their full cascade),
    /// the user's answers and interactions, and finally the user.
    #[instrument(skip(self), err)]
    pub async fn delete_user(&self, clerk_id: &str) -> Result<User> {
        let user = self.get_user_by_clerk_id(clerk_id).await?;
        let first_batch = Window { skip: 0, limit: CASCADE_BATCH };

        loop {
            let mut query = QuestionQuery::new(QuestionOrder::Insertion, first_batch);
            query.author = Some(user.id);
            let (batch, _) = self.repos.questions.find_questions(query).await?;
            if batch.is_empty() {
                break;
            }
            for question in &batch {
                self.questions.cascade_delete(question).await?;
            }
        }

        loop {
            let query = AnswerQuery {
                question: None,
                author: Some(user.id),
                search: None,
                order: AnswerOrder::OldestFirst,
                window: first_batch,
            };
            let (batch, _) = self.repos.answers.find_answers(query).await?;
            if batch.is_empty() {
                break;
            }
            for answer in &batch {
                self.repos.answers.delete_answer(answer.id).await?;
                self.repos.interactions.delete_for_answer(answer.id).await?;
            }
        }

        self.repos.interactions.delete_for_user(user.id).await?;
        self.repos.users.delete_user(user.id).await?;
        info!(user = %user.id, "user deleted");
        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get_all_users(&self, params: GetAllUsersParams) -> Result<Page<User>> {
        let window = params.page.window()?;
        let query = UserQuery {
            search: search_text(params.search),
            order: params.filter.order(),
            window,
        };
        let (users, total) = self.repos.users.list_users(query).await?;
        Ok(Page::new(users, total, window))
    }

    /// Saves the question, or unsaves it when already saved. Returns whether
    /// the question is saved afterwards.
    #[instrument(skip(self), err)]
    pub async fn toggle_save_question(&self, params: ToggleSaveQuestionParams) -> Result<bool> {
        let user = self.get_user(params.user).await?;
        if user.saved.contains(&params.question) {
            self.repos.users.unsave_question(user.id, params.question).await?;
            return Ok(false);
        }

        self.repos
            .questions
            .find_question(params.question)
            .await?
            .ok_or_else(|| AppError::not_found("Question", params.question))?;
        self.repos.users.save_question(user.id, params.question).await?;
        Ok(true)
    }

    #[instrument(skip(self), err)]
    pub async fn get_saved_questions(&self, params: GetSavedQuestionsParams) -> Result<Page<Question>> {
        let window = params.page.window()?;
        let user = self.get_user_by_clerk_id(&params.clerk_id).await?;

        let mut query = QuestionQuery::new(params.filter.order(), window);
        query.saved_by = Some(user.id);
        query.search = search_text(params.search);
        let (questions, total) = self.repos.questions.find_questions(query).await?;
        Ok(Page::new(questions, total, window))
    }

    #[instrument(skip(self), err)]
    pub async fn get_user_info(&self, clerk_id: &str) -> Result<UserInfo> {
        let user = self.get_user_by_clerk_id(clerk_id).await?;
        let none = Window { skip: 0, limit: 0 };

        let mut questions = QuestionQuery::new(QuestionOrder::Insertion, none);
        questions.author = Some(user.id);
        let (_, total_questions) = self.repos.questions.find_questions(questions).await?;

        let answers = AnswerQuery {
            question: None,
            author: Some(user.id),
            search: None,
            order: AnswerOrder::OldestFirst,
            window: none,
        };
        let (_, total_answers) = self.repos.answers.find_answers(answers).await?;

        Ok(UserInfo { user, total_questions, total_answers })
    }

    /// The user's questions, most viewed then most upvoted first.
    #[instrument(skip(self), err)]
    pub async fn get_user_questions(&self, params: GetUserStatsParams) -> Result<Page<Question>> {
        let window = params.page.window()?;
        let mut query = QuestionQuery::new(QuestionOrder::Hottest, window);
        query.author = Some(params.user);
        let (questions, total) = self.repos.questions.find_questions(query).await?;
        Ok(Page::new(questions, total, window))
    }

    /// The user's answers, most upvoted first.
    #[instrument(skip(self), err)]
    pub async fn get_user_answers(&self, params: GetUserStatsParams) -> Result<Page<Answer>> {
        let window = params.page.window()?;
        let query = AnswerQuery {
            question: None,
            author: Some(params.user),
            search: None,
            order: AnswerOrder::HighestUpvotes,
            window,
        };
        let (answers, total) = self.repos.answers.find_answers(query).await?;
        Ok(Page::new(answers, total, window))
    }
}
