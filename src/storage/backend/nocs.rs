use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use tracing::info;

use super::converters::{model_to_noc, noc_to_active_model};
use super::{CrmStorage, retry};
use crate::errors::{CrmError, Result};
use crate::storage::models::Noc;

use migration::entities::noc;

impl CrmStorage {
    pub async fn insert_noc(&self, item: &Noc) -> Result<Noc> {
        let model = noc_to_active_model(item)
            .insert(&self.db)
            .await
            .map_err(|e| {
                CrmError::insert_failed(e, format!("NOC for loan {}", item.loan_id))
            })?;
        info!("NOC {} issued for loan {}", model.reference_no, model.loan_id);
        Ok(model_to_noc(model))
    }

    pub async fn get_noc_by_loan(&self, loan_id: &str) -> Result<Option<Noc>> {
        let db = &self.db;
        let id = loan_id.to_string();
        let model = retry::with_retry(
            &format!("get_noc_by_loan({})", loan_id),
            self.retry_config,
            || async {
                noc::Entity::find()
                    .filter(noc::Column::LoanId.eq(id.clone()))
                    .one(db)
                    .await
            },
        )
        .await?;
        Ok(model.map(model_to_noc))
    }

    pub async fn noc_reference_exists(&self, reference_no: &str) -> Result<bool> {
        Ok(noc::Entity::find_by_id(reference_no.to_string())
            .one(&self.db)
            .await?
            .is_some())
    }
}
