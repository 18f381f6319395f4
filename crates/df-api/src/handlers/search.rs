use actix_web::{web, HttpResponse};
use df_core::query::SearchKind;
use df_services::search::GlobalSearchParams;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<SearchKind>,
}

pub async fn global_search(data: web::Data<AppState>, query: web::Query<SearchQuery>) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let hits = data
        .forum
        .search
        .global_search(GlobalSearchParams { query: query.q, kind: query.kind })
        .await?;
    Ok(HttpResponse::Ok().json(hits))
}
