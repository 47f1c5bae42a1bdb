/*
 * Responsibility
 * - /tasks 系 handler
 * - Query/Path を extractor で受け、DTO validation → repo 呼び出し
 * - 認証済み主体は middleware 経由の CurrentUser で受け取る
 */
use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    api::v1::{
        dto::tasks::{
            ListTasksQuery, PageResponse, SearchTaskResponse, SearchTasksQuery, TaskResponse,
        },
        extractors::CurrentUser,
    },
    error::AppError,
    repos::task_repo,
    state::AppState,
};

pub async fn search_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SearchTasksQuery>,
) -> Result<Json<PageResponse<SearchTaskResponse>>, AppError> {
    let page = query
        .page_request()
        .map_err(|msg| AppError::bad_request("INVALID_PAGE", msg))?;

    tracing::debug!(user_id = user.user_id, "searching tasks");

    let result = task_repo::search(&state.db, &query.condition(), page).await?;

    Ok(Json(PageResponse::from_page(
        result,
        SearchTaskResponse::from,
    )))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<PageResponse<TaskResponse>>, AppError> {
    let page = query
        .page_request()
        .map_err(|msg| AppError::bad_request("INVALID_PAGE", msg))?;

    let result = task_repo::list_by_conditions(
        &state.db,
        query.weather.as_deref(),
        query.modified_from,
        query.modified_to,
        page,
    )
    .await?;

    Ok(Json(PageResponse::from_page(result, TaskResponse::from)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<TaskResponse>, AppError> {
    let row = task_repo::fetch_with_owner(&state.db, task_id)
        .await?
        .ok_or_else(|| AppError::not_found("task"))?;

    Ok(Json(row.into()))
}
