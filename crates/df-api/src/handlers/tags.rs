use actix_web::{web, HttpResponse};
use df_core::models::TagId;
use df_core::query::TagFilter;
use df_services::tags::{GetAllTagsParams, GetQuestionsByTagParams};
use serde::Deserialize;
use uuid::Uuid;

use super::page_request;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub filter: TagFilter,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TagQuestionsQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list_tags(data: web::Data<AppState>, query: web::Query<ListTagsQuery>) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let page = data
        .forum
        .tags
        .get_all_tags(GetAllTagsParams {
            search: query.search,
            filter: query.filter,
            page: page_request(query.page, query.page_size),
        })
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn popular_tags(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let tags = data.forum.tags.get_popular_tags().await?;
    Ok(HttpResponse::Ok().json(tags))
}

pub async fn tag_questions(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<TagQuestionsQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let tagged = data
        .forum
        .tags
        .get_questions_by_tag(GetQuestionsByTagParams {
            tag: TagId(path.into_inner()),
            search: query.search,
            page: page_request(query.page, query.page_size),
        })
        .await?;
    Ok(HttpResponse::Ok().json(tagged))
}
