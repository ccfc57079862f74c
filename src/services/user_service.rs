//! CRM 账号与登录

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use ts_rs::TS;

use crate::api::services::crm::TS_EXPORT_PATH;
use crate::config::AuthConfig;
use crate::errors::{CrmError, Result};
use crate::storage::{CrmStorage, User, UserFilter, UserRole, UserStatus};
use crate::utils::password::{hash_password, validate_password_strength, verify_password};

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub password: Option<String>,
}

fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(CrmError::validation(format!("Invalid email '{}'", raw.trim()))),
    }
}

pub struct UserService {
    storage: Arc<CrmStorage>,
}

impl UserService {
    pub fn new(storage: Arc<CrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(CrmError::validation("User name is required"));
        }
        let email = normalize_email(&req.email)?;
        validate_password_strength(&req.password)?;

        if self.storage.get_user_by_email(&email).await?.is_some() {
            return Err(CrmError::conflict(format!(
                "A user with email {} already exists",
                email
            )));
        }

        let now = Utc::now();
        let user = User {
            user_id: 0,
            name,
            email,
            password_hash: hash_password(&req.password)?,
            role: req.role,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        let user = self.storage.insert_user(&user).await?;
        info!(
            "UserService: created {} account {} ({})",
            user.role, user.user_id, user.email
        );
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| CrmError::not_found(format!("User {} not found", user_id)))
    }

    pub async fn list_users(
        &self,
        filter: &UserFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<User>, u64)> {
        self.storage
            .list_users(filter, page.max(1), page_size.clamp(1, 100))
            .await
    }

    pub async fn update_user(&self, user_id: i64, req: UpdateUserRequest) -> Result<User> {
        let mut user = self.get_user(user_id).await?;

        if let Some(name) = req.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CrmError::validation("User name cannot be empty"));
            }
            user.name = name;
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        if let Some(status) = req.status {
            user.status = status;
        }
        if let Some(password) = req.password {
            validate_password_strength(&password)?;
            user.password_hash = hash_password(&password)?;
        }
        user.updated_at = Utc::now();

        let user = self.storage.update_user(&user).await?;
        info!("UserService: updated user {}", user_id);
        Ok(user)
    }

    /// 校验凭据并记录登录时间
    ///
    /// 邮箱不存在和密码错误返回相同的错误
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let invalid = || CrmError::unauthorized("Invalid email or password");

        let mut user = self
            .storage
            .get_user_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(invalid)?;
        if !verify_password(password, &user.password_hash)? {
            warn!("UserService: failed login for {}", user.email);
            return Err(invalid());
        }
        if user.status != UserStatus::Active {
            return Err(CrmError::forbidden(format!(
                "Account {} is inactive",
                user.email
            )));
        }

        self.storage.touch_last_login(user.user_id).await?;
        user.last_login_at = Some(Utc::now());
        info!("UserService: {} signed in", user.email);
        Ok(user)
    }

    /// 用户表为空时根据 `[auth]` 创建首个管理员
    pub async fn bootstrap_admin(&self, auth: &AuthConfig) -> Result<Option<User>> {
        if self.storage.count_users().await? > 0 {
            return Ok(None);
        }

        let (Some(email), Some(password)) = (
            auth.bootstrap_admin_email.as_deref(),
            auth.bootstrap_admin_password.as_deref(),
        ) else {
            warn!(
                "No users exist and no bootstrap admin is configured; \
                 set auth.bootstrap_admin_email/password or run `loancrm user add`"
            );
            return Ok(None);
        };

        let user = self
            .create_user(CreateUserRequest {
                name: auth.bootstrap_admin_name.clone(),
                email: email.to_string(),
                password: password.to_string(),
                role: UserRole::Admin,
            })
            .await?;
        warn!("Bootstrap admin {} created", user.email);
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email(" Admin@Example.com ").unwrap(),
            "admin@example.com"
        );
        assert!(normalize_email("admin").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("admin@localhost").is_err());
    }
}
