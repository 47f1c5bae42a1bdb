/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /tasks を定義。/auth, /admin の prefix は policy 側で予約済み
 *   (handler は無いが、認可ルールはそこにも効く)
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    tasks::{get_task, list_tasks, search_tasks},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks))
        .route("/tasks/search", get(search_tasks))
        .route("/tasks/{task_id}", get(get_task))
}
