/*
 * Responsibility
 * - tasks の request/response DTO
 * - 1 始まりの page/size を repo の offset/page_size へ変換
 * - validation (形式チェック) 用の validate 相当はここに持たせる
 */
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::task_repo::{Page, PageRequest, SearchCondition, SearchRow, TaskWithOwnerRow};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// page は 1 始まり。size は 1..=100。
fn page_request(page: Option<i64>, size: Option<i64>) -> Result<PageRequest, &'static str> {
    let page = page.unwrap_or(1);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 1 {
        return Err("page must be >= 1");
    }
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err("size must be between 1 and 100");
    }

    Ok(PageRequest {
        offset: (page - 1) * size,
        page_size: size,
    })
}

#[derive(Debug, Deserialize)]
pub struct SearchTasksQuery {
    pub keyword: Option<String>,
    pub nickname: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl SearchTasksQuery {
    pub fn page_request(&self) -> Result<PageRequest, &'static str> {
        page_request(self.page, self.size)
    }

    pub fn condition(&self) -> SearchCondition {
        SearchCondition {
            keyword: self.keyword.clone(),
            nickname: self.nickname.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub weather: Option<String>,
    pub modified_from: Option<NaiveDate>,
    pub modified_to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl ListTasksQuery {
    pub fn page_request(&self) -> Result<PageRequest, &'static str> {
        page_request(self.page, self.size)
    }
}

#[derive(Debug, Serialize)]
pub struct SearchTaskResponse {
    pub title: String,
    pub collaborator_count: i64,
    pub comment_count: i64,
}

impl From<SearchRow> for SearchTaskResponse {
    fn from(row: SearchRow) -> Self {
        Self {
            title: row.title,
            collaborator_count: row.collaborator_count,
            comment_count: row.comment_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskOwnerResponse {
    pub id: i64,
    pub email: String,
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub contents: Option<String>,
    pub weather: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub owner: Option<TaskOwnerResponse>,
}

impl From<TaskWithOwnerRow> for TaskResponse {
    fn from(row: TaskWithOwnerRow) -> Self {
        // LEFT JOIN miss は owner 列が全て NULL になる
        let owner = match (row.owner_id, row.owner_email, row.owner_nickname) {
            (Some(id), Some(email), Some(nickname)) => Some(TaskOwnerResponse {
                id,
                email,
                nickname,
            }),
            _ => None,
        };

        Self {
            id: row.task_id,
            title: row.title,
            contents: row.contents,
            weather: row.weather,
            created_at: row.created_at,
            modified_at: row.modified_at,
            owner,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub size: i64,
}

impl<T> PageResponse<T> {
    pub fn from_page<R>(page: Page<R>, f: impl Fn(R) -> T) -> Self {
        let size = page.page_size;
        Self {
            content: page.content.into_iter().map(f).collect(),
            total_count: page.total_count,
            // offset は (page - 1) * size で作っているので割り切れる
            page: page.offset / size + 1,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_first_page_of_ten() {
        let req = page_request(None, None).unwrap();
        assert_eq!(req.offset, 0);
        assert_eq!(req.page_size, 10);
    }

    #[test]
    fn page_converts_to_offset() {
        let req = page_request(Some(3), Some(20)).unwrap();
        assert_eq!(req.offset, 40);
        assert_eq!(req.page_size, 20);
    }

    #[test]
    fn page_and_size_are_validated() {
        assert!(page_request(Some(0), None).is_err());
        assert!(page_request(Some(-1), None).is_err());
        assert!(page_request(None, Some(0)).is_err());
        assert!(page_request(None, Some(101)).is_err());
    }

    #[test]
    fn page_response_restores_page_number() {
        let page = Page {
            content: vec![1, 2, 3],
            total_count: 43,
            offset: 40,
            page_size: 20,
        };
        let res = PageResponse::from_page(page, |n| n * 10);

        assert_eq!(res.content, vec![10, 20, 30]);
        assert_eq!(res.total_count, 43);
        assert_eq!(res.page, 3);
        assert_eq!(res.size, 20);
    }

    #[test]
    fn owner_is_none_when_join_misses() {
        let row = TaskWithOwnerRow {
            task_id: 1,
            title: "t".into(),
            contents: None,
            weather: None,
            created_at: Utc::now(),
            modified_at: Utc::now(),
            owner_id: None,
            owner_email: None,
            owner_nickname: None,
        };
        assert!(TaskResponse::from(row).owner.is_none());
    }

    #[test]
    fn owner_requires_all_columns() {
        let row = TaskWithOwnerRow {
            task_id: 1,
            title: "t".into(),
            contents: None,
            weather: None,
            created_at: Utc::now(),
            modified_at: Utc::now(),
            owner_id: Some(7),
            owner_email: None,
            owner_nickname: Some("nick".into()),
        };
        assert!(TaskResponse::from(row).owner.is_none());
    }
}
