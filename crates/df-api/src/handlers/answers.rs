use actix_web::{web, HttpRequest, HttpResponse};
use df_core::models::{AnswerId, QuestionId, VoteTarget};
use df_core::query::AnswerSort;
use df_services::answers::{CreateAnswerParams, DeleteAnswerParams, GetAnswersParams};
use df_services::vote::VoteParams;
use serde::Deserialize;
use uuid::Uuid;

use super::page_request;
use super::questions::VoteBody;
use crate::error::ApiResult;
use crate::identity::require_user;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAnswersQuery {
    #[serde(default)]
    pub sort: AnswerSort,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAnswerBody {
    pub content: String,
}

pub async fn list_answers(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ListAnswersQuery>,
) -> ApiResult<HttpResponse> {
    let page = data
        .forum
        .answers
        .get_answers(GetAnswersParams {
            question: QuestionId(path.into_inner()),
            sort: query.sort,
            page: page_request(query.page, query.page_size),
        })
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn create_answer(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CreateAnswerBody>,
) -> ApiResult<HttpResponse> {
    let author = require_user(&req, &data).await?;
    let answer = data
        .forum
        .answers
        .create_answer(CreateAnswerParams {
            content: body.into_inner().content,
            author: author.id,
            question: QuestionId(path.into_inner()),
        })
        .await?;
    Ok(HttpResponse::Created().json(answer))
}

pub async fn delete_answer(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let actor = require_user(&req, &data).await?;
    data.forum
        .answers
        .delete_answer(DeleteAnswerParams { answer: AnswerId(path.into_inner()), actor: actor.id })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn vote_answer(
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
            target: VoteTarget::Answer(AnswerId(path.into_inner())),
            voter: voter.id,
            direction: body.direction,
            has_upvoted: body.has_upvoted,
            has_downvoted: body.has_downvoted,
        })
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}
