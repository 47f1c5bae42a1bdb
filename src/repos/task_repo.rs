/*
 * Responsibility
 * - tasks テーブル向け SQLx 操作（検索・集計・単体取得）
 * - read-only: このモジュールは書き込みを行わない
 * - 任意条件は Option のまま受け、NULL ガード付き bind で SQL に渡す
 *   (absent = 制約なし。query 文字列の組み立て分岐はしない)
 */
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

/// 検索条件。全フィールド独立に省略可能。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCondition {
    pub keyword: Option<String>,
    pub nickname: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// offset/limit 窓。並び順は作成日時の降順で固定（呼び出し側から指定不可）。
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub offset: i64,
    pub page_size: i64,
}

/// 1 窓分の結果と、同一条件での総件数。
#[derive(Debug)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_count: i64,
    pub offset: i64,
    pub page_size: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SearchRow {
    pub title: String,
    #[sqlx(rename = "collaboratorCount")]
    pub collaborator_count: i64,
    #[sqlx(rename = "commentCount")]
    pub comment_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskWithOwnerRow {
    #[sqlx(rename = "taskId")]
    pub task_id: i64,

    pub title: String,
    pub contents: Option<String>,
    pub weather: Option<String>,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "modifiedAt")]
    pub modified_at: DateTime<Utc>,

    // owner は LEFT JOIN なので全て nullable
    #[sqlx(rename = "ownerId")]
    pub owner_id: Option<i64>,
    #[sqlx(rename = "ownerEmail")]
    pub owner_email: Option<String>,
    #[sqlx(rename = "ownerNickname")]
    pub owner_nickname: Option<String>,
}

/// SQL に渡す直前の形。`None` = 制約なし、を明示するための層。
///
/// - keyword / nickname: 空白のみの入力は「条件なし」に落とす
/// - 日付: 開始日は当日 0 時以上（含む）、終了日は翌日 0 時未満（排他）
#[derive(Debug, Clone, Default, PartialEq)]
struct SearchFilters {
    title_like: Option<String>,
    nickname_like: Option<String>,
    created_from: Option<DateTime<Utc>>,
    created_until: Option<DateTime<Utc>>,
}

fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl SearchFilters {
    fn from_condition(cond: &SearchCondition) -> Self {
        Self {
            title_like: cond
                .keyword
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .map(str::to_owned),
            nickname_like: cond
                .nickname
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .map(str::to_owned),
            created_from: cond.start_date.map(start_of_day_utc),
            created_until: cond.end_date.and_then(|d| d.succ_opt()).map(start_of_day_utc),
        }
    }
}

/// 条件に合う tasks を 1 窓分、担当者数・コメント数付きで返す。
///
/// - title / 担当者 nickname は部分一致 (case-insensitive)
/// - 件数は DISTINCT カウント（join の重複行で膨らまない）
/// - 総件数は同一条件の別クエリで数える（窓に依存しない）
pub async fn search(
    db: &PgPool,
    cond: &SearchCondition,
    page: PageRequest,
) -> Result<Page<SearchRow>, RepoError> {
    let filters = SearchFilters::from_condition(cond);

    let content = sqlx::query_as::<_, SearchRow>(
        r#"
        SELECT
            t.title,
            COUNT(DISTINCT c."collaboratorId") AS "collaboratorCount",
            COUNT(DISTINCT cm."commentId") AS "commentCount"
        FROM tasks t
        LEFT JOIN collaborators c ON c."taskId" = t."taskId"
        LEFT JOIN users u ON u."userId" = c."userId"
        LEFT JOIN comments cm ON cm."taskId" = t."taskId"
        WHERE ($1::text IS NULL OR t.title ILIKE '%' || $1 || '%')
          AND ($2::text IS NULL OR u.nickname ILIKE '%' || $2 || '%')
          AND ($3::timestamptz IS NULL OR t."createdAt" >= $3)
          AND ($4::timestamptz IS NULL OR t."createdAt" < $4)
        GROUP BY t."taskId"
        ORDER BY t."createdAt" DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filters.title_like.as_deref())
    .bind(filters.nickname_like.as_deref())
    .bind(filters.created_from)
    .bind(filters.created_until)
    .bind(page.page_size)
    .bind(page.offset)
    .fetch_all(db)
    .await?;

    // comments は件数判定に影響しないので join しない
    let total_count = sqlx::query_scalar::<_, Option<i64>>(
        r#"
        SELECT COUNT(DISTINCT t."taskId")
        FROM tasks t
        LEFT JOIN collaborators c ON c."taskId" = t."taskId"
        LEFT JOIN users u ON u."userId" = c."userId"
        WHERE ($1::text IS NULL OR t.title ILIKE '%' || $1 || '%')
          AND ($2::text IS NULL OR u.nickname ILIKE '%' || $2 || '%')
          AND ($3::timestamptz IS NULL OR t."createdAt" >= $3)
          AND ($4::timestamptz IS NULL OR t."createdAt" < $4)
        "#,
    )
    .bind(filters.title_like.as_deref())
    .bind(filters.nickname_like.as_deref())
    .bind(filters.created_from)
    .bind(filters.created_until)
    .fetch_one(db)
    .await?
    .unwrap_or(0);

    Ok(Page {
        content,
        total_count,
        offset: page.offset,
        page_size: page.page_size,
    })
}

/// task を所有ユーザーごと 1 往復で取得する。存在しない id は Ok(None)。
pub async fn fetch_with_owner(
    db: &PgPool,
    task_id: i64,
) -> Result<Option<TaskWithOwnerRow>, RepoError> {
    let row = sqlx::query_as::<_, TaskWithOwnerRow>(
        r#"
        SELECT
            t."taskId", t.title, t.contents, t.weather, t."createdAt", t."modifiedAt",
            u."userId" AS "ownerId",
            u.email AS "ownerEmail",
            u.nickname AS "ownerNickname"
        FROM tasks t
        LEFT JOIN users u ON u."userId" = t."userId"
        WHERE t."taskId" = $1
        "#,
    )
    .bind(task_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// 天気・更新日範囲での絞り込み付き一覧。条件は全て省略可能。
/// 日付境界は検索と同じ規約（開始日 0 時以上、終了日は翌日 0 時未満）。
pub async fn list_by_conditions(
    db: &PgPool,
    weather: Option<&str>,
    modified_from: Option<NaiveDate>,
    modified_to: Option<NaiveDate>,
    page: PageRequest,
) -> Result<Page<TaskWithOwnerRow>, RepoError> {
    let modified_from = modified_from.map(start_of_day_utc);
    let modified_until = modified_to.and_then(|d| d.succ_opt()).map(start_of_day_utc);

    let content = sqlx::query_as::<_, TaskWithOwnerRow>(
        r#"
        SELECT
            t."taskId", t.title, t.contents, t.weather, t."createdAt", t."modifiedAt",
            u."userId" AS "ownerId",
            u.email AS "ownerEmail",
            u.nickname AS "ownerNickname"
        FROM tasks t
        LEFT JOIN users u ON u."userId" = t."userId"
        WHERE ($1::text IS NULL OR t.weather = $1)
          AND ($2::timestamptz IS NULL OR t."modifiedAt" >= $2)
          AND ($3::timestamptz IS NULL OR t."modifiedAt" < $3)
        ORDER BY t."modifiedAt" DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(weather)
    .bind(modified_from)
    .bind(modified_until)
    .bind(page.page_size)
    .bind(page.offset)
    .fetch_all(db)
    .await?;

    let total_count = sqlx::query_scalar::<_, Option<i64>>(
        r#"
        SELECT COUNT(*)
        FROM tasks t
        WHERE ($1::text IS NULL OR t.weather = $1)
          AND ($2::timestamptz IS NULL OR t."modifiedAt" >= $2)
          AND ($3::timestamptz IS NULL OR t."modifiedAt" < $3)
        "#,
    )
    .bind(weather)
    .bind(modified_from)
    .bind(modified_until)
    .fetch_one(db)
    .await?
    .unwrap_or(0);

    Ok(Page {
        content,
        total_count,
        offset: page.offset,
        page_size: page.page_size,
    })
}
