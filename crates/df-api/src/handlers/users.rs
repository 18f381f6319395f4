use actix_web::{web, HttpRequest, HttpResponse};
use df_core::models::{UserId, UserUpdate};
use df_core::pagination::PageRequest;
use df_core::query::{SavedFilter, UserFilter};
use df_services::tags::GetTopInteractedTagsParams;
use df_services::users::{
    GetAllUsersParams, GetSavedQuestionsParams, GetUserStatsParams, UpdateUserParams, PROFILE_PAGE_SIZE,
};
use serde::Deserialize;
use uuid::Uuid;

use super::page_request;
use crate::error::ApiResult;
use crate::identity::require_user;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub filter: UserFilter,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SavedQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub filter: SavedFilter,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TopTagsQuery {
    pub limit: Option<usize>,
}

pub async fn list_users(data: web::Data<AppState>, query: web::Query<ListUsersQuery>) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let page = data
        .forum
        .users
        .get_all_users(GetAllUsersParams {
            search: query.search,
            filter: query.filter,
            page: page_request(query.page, query.page_size),
        })
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn user_info(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let info = data.forum.users.get_user_info(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(info))
}

/// Profile edits apply to the caller only.
pub async fn update_me(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UserUpdate>,
) -> ApiResult<HttpResponse> {
    let me = require_user(&req, &data).await?;
    let user = data
        .forum
        .users
        .update_user(UpdateUserParams { clerk_id: me.clerk_id, update: body.into_inner() })
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn saved_questions(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<SavedQuery>,
) -> ApiResult<HttpResponse> {
    let me = require_user(&req, &data).await?;
    let query = query.into_inner();
    let page = data
        .forum
        .users
        .get_saved_questions(GetSavedQuestionsParams {
            clerk_id: me.clerk_id,
            search: query.search,
            filter: query.filter,
            page: page_request(query.page, query.page_size),
        })
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

fn stats_params(user: Uuid, query: &StatsQuery) -> GetUserStatsParams {
    GetUserStatsParams {
        user: UserId(user),
        page: PageRequest::new(query.page.unwrap_or(1), query.page_size.unwrap_or(PROFILE_PAGE_SIZE)),
    }
}

pub async fn user_questions(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<StatsQuery>,
) -> ApiResult<HttpResponse> {
    let page = data.forum.users.get_user_questions(stats_params(path.into_inner(), &query)).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn user_answers(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<StatsQuery>,
) -> ApiResult<HttpResponse> {
    let page = data.forum.users.get_user_answers(stats_params(path.into_inner(), &query)).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn user_top_tags(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<TopTagsQuery>,
) -> ApiResult<HttpResponse> {
    let mut params = GetTopInteractedTagsParams::new(UserId(path.into_inner()));
    if let Some(limit) = query.limit {
        params.limit = limit;
    }
    let tags = data.forum.tags.get_top_interacted_tags(params).await?;
    Ok(HttpResponse::Ok().json(tags))
}
