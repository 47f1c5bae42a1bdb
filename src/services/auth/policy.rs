//! Path-prefix ごとのアクセス要件（認可ルール）
//!
//! - pure function のみ: I/O なし、状態なし
//! - 評価は先頭から first-match。具体的な prefix を先に置くこと。
//! - `/auth` は未認証で許可（登録・ログイン系）、`/admin` は ADMIN のみ、
//!   それ以外は認証済みであれば許可。

use crate::services::auth::{AuthUser, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AdminOnly,
}

const RULES: &[(&str, Access)] = &[
    ("/health", Access::Public),
    ("/auth", Access::Public),
    ("/admin", Access::AdminOnly),
];

/// ルール表に無い path は認証必須
pub fn required_access(path: &str) -> Access {
    RULES
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map(|(_, access)| *access)
        .unwrap_or(Access::Authenticated)
}

pub fn authorize(path: &str, principal: Option<&AuthUser>) -> bool {
    match required_access(path) {
        Access::Public => true,
        Access::Authenticated => principal.is_some(),
        Access::AdminOnly => principal.is_some_and(|p| p.role == UserRole::Admin),
    }
}
