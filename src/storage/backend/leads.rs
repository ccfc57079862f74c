//! 线索读写，包括转化为客户

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::info;

use super::converters::{client_to_active_model, lead_to_active_model, model_to_client, model_to_lead};
use super::{CrmStorage, LeadFilter, retry};
use crate::errors::{CrmError, Result};
use crate::storage::models::{Client, Lead, LeadStatus};

use migration::entities::lead;

fn lead_condition(filter: &LeadFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(status) = filter.status {
        condition = condition.add(lead::Column::Status.eq(status.to_string()));
    }
    if let Some(ref branch) = filter.branch {
        condition = condition.add(lead::Column::Branch.eq(branch.clone()));
    }
    if let Some(ref assigned_to) = filter.assigned_to {
        condition = condition.add(lead::Column::AssignedTo.eq(assigned_to.clone()));
    }
    if let Some(ref search) = filter.search {
        condition = condition.add(
            Condition::any()
                .add(lead::Column::Name.contains(search))
                .add(lead::Column::Phone.contains(search)),
        );
    }
    condition
}

impl CrmStorage {
    pub async fn insert_lead(&self, lead: &Lead) -> Result<Lead> {
        let model = lead_to_active_model(lead, true)?
            .insert(&self.db)
            .await
            .map_err(|e| CrmError::insert_failed(e, format!("Lead {}", lead.phone)))?;
        self.invalidate_count_cache();
        model_to_lead(model)
    }

    pub async fn get_lead(&self, lead_id: i64) -> Result<Option<Lead>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("get_lead({})", lead_id),
            self.retry_config,
            || async { lead::Entity::find_by_id(lead_id).one(db).await },
        )
        .await?;
        model.map(model_to_lead).transpose()
    }

    pub async fn find_lead_by_phone(&self, phone: &str) -> Result<Option<Lead>> {
        lead::Entity::find()
            .filter(lead::Column::Phone.eq(phone.to_string()))
            .order_by_desc(lead::Column::CreatedAt)
            .one(&self.db)
            .await?
            .map(model_to_lead)
            .transpose()
    }

    pub async fn update_lead(&self, lead: &Lead) -> Result<Lead> {
        let model = lead_to_active_model(lead, false)?
            .update(&self.db)
            .await
            .map_err(|e| {
                CrmError::database_operation(format!(
                    "Failed to update lead {}: {}",
                    lead.lead_id, e
                ))
            })?;
        self.invalidate_count_cache();
        model_to_lead(model)
    }

    pub async fn list_leads(
        &self,
        filter: &LeadFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Lead>, u64)> {
        let db = &self.db;
        let condition = lead_condition(filter);

        let total = self
            .cached_count(format!("leads:{:?}", filter), || async {
                lead::Entity::find()
                    .filter(condition.clone())
                    .count(db)
                    .await
            })
            .await?;

        let models = retry::with_retry("list_leads", self.retry_config, || async {
            lead::Entity::find()
                .filter(condition.clone())
                .order_by_desc(lead::Column::CreatedAt)
                .order_by_desc(lead::Column::LeadId)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        let leads = models
            .into_iter()
            .map(model_to_lead)
            .collect::<Result<Vec<_>>>()?;
        Ok((leads, total))
    }

    pub async fn list_all_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>> {
        lead::Entity::find()
            .filter(lead_condition(filter))
            .order_by_asc(lead::Column::LeadId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_lead)
            .collect()
    }

    /// 在同一事务中创建客户并将线索标记为 Converted
    pub async fn convert_lead(&self, lead_id: i64, client: &Client) -> Result<(Lead, Client)> {
        let txn = self.db.begin().await?;

        let current = lead::Entity::find_by_id(lead_id)
            .one(&txn)
            .await?
            .ok_or_else(|| CrmError::not_found(format!("Lead {} not found", lead_id)))?;
        if current.status == LeadStatus::Converted.to_string() {
            return Err(CrmError::conflict(format!(
                "Lead {} is already converted",
                lead_id
            )));
        }

        let created = client_to_active_model(client, true)
            .insert(&txn)
            .await
            .map_err(|e| CrmError::database_operation(format!("Failed to create client: {}", e)))?;

        let mut converted: lead::ActiveModel = current.into();
        converted.status = Set(LeadStatus::Converted.to_string());
        converted.client_id = Set(Some(created.client_id));
        converted.updated_at = Set(Utc::now());
        let converted = converted.update(&txn).await?;

        txn.commit().await?;
        self.invalidate_count_cache();
        info!(
            "Lead {} converted to client {}",
            lead_id, created.client_id
        );

        Ok((model_to_lead(converted)?, model_to_client(created)?))
    }
}
