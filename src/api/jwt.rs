use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AuthConfig;
use crate::storage::{User, UserRole};

const ACCESS_TOKEN_TYPE: &str = "access";

/// Access Token 声明
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// 用户 ID
    pub sub: String,
    pub name: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

/// HS256 Access Token 的签发与校验
///
/// 以 `web::Data<JwtService>` 注册，认证中间件从 app data 中读取
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: u64,
}

impl JwtService {
    pub fn new(secret: &str, access_token_minutes: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
        }
    }

    /// 密钥为空时随机生成，重启后旧 Token 失效
    pub fn from_config(auth: &AuthConfig) -> Self {
        let secret = if auth.jwt_secret.is_empty() {
            warn!("auth.jwt_secret is not set, generating a random secret for this process");
            crate::utils::generate_secure_token(32)
        } else {
            auth.jwt_secret.clone()
        };
        Self::new(&secret, auth.access_token_minutes)
    }

    pub fn access_token_minutes(&self) -> u64 {
        self.access_token_minutes
    }

    /// Token 及其过期时间
    pub fn issue_token(
        &self,
        user: &User,
    ) -> Result<(String, DateTime<Utc>), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.access_token_minutes as i64);
        let claims = AccessClaims {
            sub: user.user_id.to_string(),
            name: user.name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok((token, expires_at))
    }

    pub fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &Validation::default())?;

        if token_data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }

        Ok(token_data.claims)
    }
}
