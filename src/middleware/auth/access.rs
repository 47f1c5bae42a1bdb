/*
 * Responsibility
 * - Bearer トークンの検証 (ヘッダ抽出 → 検証 → 拒否)
 * - 成功時に、認証済み主体 (AuthUser) を request extensions に載せる
 * - path-prefix ごとの認可 (policy) もここで適用する
 */
//! access token 検証 → AuthUser を extensions に入れる
//!
//! - `/auth` `/health` 系は未認証で素通し（codec に触れない）
//! - それ以外はヘッダ検証 → AuthUser 構築 → `/admin` は role チェック
//! - 失敗は request 単位で打ち切り。handler は実行されない。
//! - ログには失敗種別のみ載せる（token 本体は出さない）

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::policy::{self, Access};
use crate::state::AppState;

/// `/api/v1/*` に認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // nest 配下では prefix (/api/v1) が剥がされた相対パスが見える。
    // policy はその相対パス (/tasks, /admin, ...) で判定する。
    let required = policy::required_access(req.uri().path());

    if required == Access::Public {
        return Ok(next.run(req).await);
    }

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_user = match state.auth.authenticate(header) {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = req.uri().path(),
                "access token verification failed"
            );
            return Err(AppError::from(err));
        }
    };

    // 認証は通ったが role が足りないケース (/admin を USER が叩く等)
    if !policy::authorize(req.uri().path(), Some(&auth_user)) {
        tracing::warn!(
            user_id = auth_user.user_id,
            role = auth_user.role.as_str(),
            path = req.uri().path(),
            "access denied by policy"
        );
        return Err(AppError::Forbidden);
    }

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}
