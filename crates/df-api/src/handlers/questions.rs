use actix_web::{web, HttpRequest, HttpResponse};
use df_core::models::{QuestionId, VoteDirection, VoteTarget};
use df_core::query::HomeFilter;
use df_services::questions::{
    CreateQuestionParams, DeleteQuestionParams, EditQuestionParams, GetQuestionsParams, ViewQuestionParams,
};
use df_services::users::ToggleSaveQuestionParams;
use df_services::vote::VoteParams;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::page_request;
use crate::error::ApiResult;
use crate::identity::{optional_user, require_user};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuestionsQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub filter: HomeFilter,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuestionBody {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditQuestionBody {
    pub title: String,
    pub content: String,
}

/// The vote button may send whether it is lit. The stored vote wins when
/// the two disagree.
#[derive(Debug, Deserialize)]
pub struct VoteBody {
    pub direction: VoteDirection,
    #[serde(default)]
    pub has_upvoted: bool,
    #[serde(default)]
    pub has_downvoted: bool,
}

pub async fn list_questions(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListQuestionsQuery>,
) -> ApiResult<HttpResponse> {
    let viewer = optional_user(&req, &data).await?;
    let query = query.into_inner();
    let page = data
        .forum
        .questions
        .get_questions(GetQuestionsParams {
            search: query.search,
            filter: query.filter,
            page: page_request(query.page, query.page_size),
            viewer: viewer.map(|u| u.id),
        })
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn create_question(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateQuestionBody>,
) -> ApiResult<HttpResponse> {
    let author = require_user(&req, &data).await?;
    let body = body.into_inner();
    let question = data
        .forum
        .questions
        .create_question(CreateQuestionParams {
            title: body.title,
            content: body.content,
            author: author.id,
            tags: body.tags,
        })
        .await?;
    Ok(HttpResponse::Created().json(question))
}

pub async fn hot_questions(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let questions = data.forum.questions.hot_questions().await?;
    Ok(HttpResponse::Ok().json(questions))
}

pub async fn get_question(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let question = data.forum.questions.get_question(QuestionId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(question))
}

pub async fn edit_question(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<EditQuestionBody>,
) -> ApiResult<HttpResponse> {
    let editor = require_user(&req, &data).await?;
    let body = body.into_inner();
    let question = data
        .forum
        .questions
        .edit_question(EditQuestionParams {
            question: QuestionId(path.into_inner()),
            editor: editor.id,
            title: body.title,
            content: body.content,
        })
        .await?;
    Ok(HttpResponse::Ok().json(question))
}

pub async fn delete_question(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let actor = require_user(&req, &data).await?;
    data.forum
        .questions
        .delete_question(DeleteQuestionParams { question: QuestionId(path.into_inner()), actor: actor.id })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn view_question(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let viewer = optional_user(&req, &data).await?;
    data.forum
        .questions
        .view_question(ViewQuestionParams { question: QuestionId(path.into_inner()), viewer: viewer.map(|u| u.id) })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn vote_question(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<VoteBody>,
) -> ApiResult<HttpResponse> {
    let voter = require_user(&req, &data).await?;
    let outcome = data
        .forum
        .votes
        .apply_vote(VoteParams {
            target: VoteTarget::Question(QuestionId(path.into_inner())),
            voter: voter.id,
            direction: body.direction,
            has_upvoted: body.has_upvoted,
            has_downvoted: body.has_downvoted,
        })
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

pub async fn toggle_save(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user = require_user(&req, &data).await?;
    let saved = data
        .forum
        .users
        .toggle_save_question(ToggleSaveQuestionParams { user: user.id, question: QuestionId(path.into_inner()) })
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "saved": saved })))
}
