//! Access token (JWT) 検証 → 認証済み主体 (AuthUser) の復元
//!
//! - `Authorization: Bearer <jwt>` のヘッダ値を受け取り、検証済みの `AuthUser` を返す
//! - token の発行はこのサービスの責務外（検証のみ）
//! - 失敗は `AuthError` で区別して返す（caller が status を選べるように潰さない）

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Errors returned by access-token verification + strict claim validation.
///
/// Each variant maps to a distinct HTTP status (see `error.rs`)。
/// caller が status を選ぶので、署名不正・期限切れ・未対応形式・claims 不正は
/// 1 つの "unauthorized" に潰さない。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingToken,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("unsupported token format")]
    Unsupported,
    #[error("invalid token claim: {0}")]
    InvalidClaims(&'static str),
    #[error("token verification failed")]
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    /// `userRole` claim は "USER" / "ADMIN" の大文字表記のみ受け付ける
    pub fn from_claim(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

/// 認証済みのリクエストに付与される主体
///
/// - token の decode に成功した場合にのみ構築される
/// - request-scoped: middleware が extensions に入れ、リクエスト終了とともに破棄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    pub nickname: String,
}

// 必要な claims のみを受け取る。presence チェックは authenticate 側で行うため
// ここでは全て Option にしておく（serde エラーで失敗理由が潰れるのを避ける）。
#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, rename = "userRole")]
    user_role: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
}

/// HS256 access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: &str, leeway_seconds: u64) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        // `exp` は jsonwebtoken の既定 required claim。iss/aud はこの token には無い。
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Verify the raw `Authorization` header value and rebuild the principal.
    ///
    /// - ヘッダ欠落 → `MissingToken`
    /// - "Bearer " prefix 欠落はそのまま decode に回し、malformed として落とす
    /// - decode は 1 リクエスト 1 回。リトライしない。
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthUser, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = header.strip_prefix(BEARER_PREFIX).unwrap_or(header);

        let claims = self.decode(token)?;

        let user_id = claims
            .sub
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(AuthError::InvalidClaims("sub"))?;

        let email = claims.email.ok_or(AuthError::InvalidClaims("email"))?;

        let role = claims
            .user_role
            .as_deref()
            .and_then(UserRole::from_claim)
            .ok_or(AuthError::InvalidClaims("userRole"))?;

        let nickname = claims
            .nickname
            .ok_or(AuthError::InvalidClaims("nickname"))?;

        Ok(AuthUser {
            user_id,
            email,
            role,
            nickname,
        })
    }

    fn decode(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let data = jsonwebtoken::decode::<AccessTokenClaims>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|e| match e.kind() {
            // 署名不正と構造の壊れた token は同じ扱い (401)
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Utf8(_) => AuthError::BadSignature,
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidAlgorithm => AuthError::Unsupported,
            // payload は decode できたが claims が JSON として不正
            ErrorKind::Json(_) => AuthError::InvalidClaims("payload"),
            // required claim (exp) の欠落
            ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims("exp"),
            _ => AuthError::Internal,
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret-0123456789";

    fn service() -> AuthService {
        AuthService::new(SECRET, 0)
    }

    fn mint(secret: &str, claims: serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims() -> serde_json::Value {
        json!({
            "sub": "42",
            "email": "user@example.com",
            "userRole": "USER",
            "nickname": "kurab",
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        })
    }

    #[test]
    fn round_trips_valid_claims_into_principal() {
        let token = mint(SECRET, valid_claims());
        let user = service()
            .authenticate(Some(&format!("Bearer {token}")))
            .unwrap();

        assert_eq!(
            user,
            AuthUser {
                user_id: 42,
                email: "user@example.com".into(),
                role: UserRole::User,
                nickname: "kurab".into(),
            }
        );
    }

    #[test]
    fn admin_role_is_recognized() {
        let mut claims = valid_claims();
        claims["userRole"] = json!("ADMIN");
        let token = mint(SECRET, claims);

        let user = service()
            .authenticate(Some(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn missing_header_fails_with_missing_token() {
        assert_eq!(
            service().authenticate(None).unwrap_err(),
            AuthError::MissingToken
        );
    }

    #[test]
    fn missing_bearer_prefix_is_treated_as_malformed() {
        let token = mint(SECRET, valid_claims());
        // prefix が無い → ヘッダ値全体を token として decode し、失敗する
        assert_eq!(
            service().authenticate(Some(&format!("Token {token}"))).unwrap_err(),
            AuthError::BadSignature
        );
    }

    #[test]
    fn garbage_token_is_bad_signature_not_a_panic() {
        assert_eq!(
            service().authenticate(Some("Bearer not-a-jwt")).unwrap_err(),
            AuthError::BadSignature
        );
    }

    #[test]
    fn wrong_secret_fails_signature_check() {
        let token = mint("other-secret", valid_claims());
        assert_eq!(
            service().authenticate(Some(&format!("Bearer {token}"))).unwrap_err(),
            AuthError::BadSignature
        );
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let mut claims = valid_claims();
        claims["exp"] = json!((Utc::now() - Duration::hours(1)).timestamp());
        let token = mint(SECRET, claims);

        assert_eq!(
            service().authenticate(Some(&format!("Bearer {token}"))).unwrap_err(),
            AuthError::Expired
        );
    }

    #[test]
    fn unexpected_algorithm_is_unsupported() {
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS384),
            &valid_claims(),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            service().authenticate(Some(&format!("Bearer {token}"))).unwrap_err(),
            AuthError::Unsupported
        );
    }

    #[test]
    fn unknown_role_fails_with_invalid_claims() {
        let mut claims = valid_claims();
        claims["userRole"] = json!("MANAGER");
        let token = mint(SECRET, claims);

        assert_eq!(
            service().authenticate(Some(&format!("Bearer {token}"))).unwrap_err(),
            AuthError::InvalidClaims("userRole")
        );
    }

    #[test]
    fn lowercase_role_is_rejected_case_sensitively() {
        let mut claims = valid_claims();
        claims["userRole"] = json!("admin");
        let token = mint(SECRET, claims);

        assert_eq!(
            service().authenticate(Some(&format!("Bearer {token}"))).unwrap_err(),
            AuthError::InvalidClaims("userRole")
        );
    }

    #[test]
    fn non_integer_subject_fails_with_invalid_claims() {
        let mut claims = valid_claims();
        claims["sub"] = json!("not-a-number");
        let token = mint(SECRET, claims);

        assert_eq!(
            service().authenticate(Some(&format!("Bearer {token}"))).unwrap_err(),
            AuthError::InvalidClaims("sub")
        );
    }

    #[test]
    fn missing_required_claims_are_named() {
        for claim in ["email", "nickname"] {
            let mut claims = valid_claims();
            claims.as_object_mut().unwrap().remove(claim);
            let token = mint(SECRET, claims);

            assert_eq!(
                service().authenticate(Some(&format!("Bearer {token}"))).unwrap_err(),
                AuthError::InvalidClaims(claim),
            );
        }
    }
}
