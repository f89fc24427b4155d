//! JWT 认证模块
//!
//! 校验外部身份服务签发的凭证。校验必须先于任何连接级操作；
//! 凭证中的角色与联系身份字段被直接信任，不再对照用户存储二次
//! 确认，这是一条显式的安全边界假设。

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use config::JwtConfig;
use domain::Role;

/// 凭证校验错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    /// 未提供凭证
    #[error("Authentication error: No token provided")]
    MissingToken,
    /// 签名或有效期校验失败
    #[error("Authentication error: Invalid token")]
    InvalidToken,
    /// 签发失败（仅测试与开发期签发路径）
    #[error("Authentication error: Token generation failed")]
    TokenCreation,
}

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// 主体 ID
    pub sub: Uuid,
    /// 角色
    pub role: Role,
    /// 联系身份（邮箱）
    pub email: String,
    /// 过期时间 (Unix timestamp)
    pub exp: i64,
}

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 生成 JWT token。签发属于外部身份服务，这里只服务测试和开发。
    pub fn generate_token(
        &self,
        user_id: Uuid,
        role: Role,
        email: &str,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: user_id,
            role,
            email: email.to_string(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenCreation)
    }

    /// 验证并解析 JWT token，无副作用。
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}
