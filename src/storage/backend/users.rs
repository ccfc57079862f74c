use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

use super::converters::{model_to_user, user_to_active_model};
use super::{CrmStorage, UserFilter, retry};
use crate::errors::{CrmError, Result};
use crate::storage::models::User;

use migration::entities::user;

fn user_condition(filter: &UserFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(role) = filter.role {
        condition = condition.add(user::Column::Role.eq(role.to_string()));
    }
    if let Some(status) = filter.status {
        condition = condition.add(user::Column::Status.eq(status.to_string()));
    }
    condition
}

impl CrmStorage {
    pub async fn insert_user(&self, user: &User) -> Result<User> {
        let model = user_to_active_model(user, true)
            .insert(&self.db)
            .await
            .map_err(|e| CrmError::insert_failed(e, format!("User {}", user.email)))?;
        self.invalidate_count_cache();
        model_to_user(model)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("get_user({})", user_id),
            self.retry_config,
            || async { user::Entity::find_by_id(user_id).one(db).await },
        )
        .await?;
        model.map(model_to_user).transpose()
    }

    /// 邮箱以小写存储
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let db = &self.db;
        let email = email.trim().to_lowercase();
        let model = retry::with_retry("get_user_by_email", self.retry_config, || async {
            user::Entity::find()
                .filter(user::Column::Email.eq(email.clone()))
                .one(db)
                .await
        })
        .await?;
        model.map(model_to_user).transpose()
    }

    pub async fn update_user(&self, user: &User) -> Result<User> {
        let model = user_to_active_model(user, false)
            .update(&self.db)
            .await
            .map_err(|e| {
                CrmError::database_operation(format!(
                    "Failed to update user {}: {}",
                    user.user_id, e
                ))
            })?;
        self.invalidate_count_cache();
        model_to_user(model)
    }

    pub async fn list_users(
        &self,
        filter: &UserFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<User>, u64)> {
        let db = &self.db;
        let condition = user_condition(filter);

        let total = self
            .cached_count(format!("users:{:?}", filter), || async {
                user::Entity::find()
                    .filter(condition.clone())
                    .count(db)
                    .await
            })
            .await?;

        let models = retry::with_retry("list_users", self.retry_config, || async {
            user::Entity::find()
                .filter(condition.clone())
                .order_by_asc(user::Column::UserId)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        let users = models
            .into_iter()
            .map(model_to_user)
            .collect::<Result<Vec<_>>>()?;
        Ok((users, total))
    }

    pub async fn count_users(&self) -> Result<u64> {
        Ok(user::Entity::find().count(&self.db).await?)
    }

    pub async fn touch_last_login(&self, user_id: i64) -> Result<()> {
        let now = Utc::now();
        user::Entity::update_many()
            .col_expr(user::Column::LastLoginAt, Expr::value(Some(now)))
            .filter(user::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
