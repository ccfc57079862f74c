use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use super::converters::{client_to_active_model, model_to_client};
use super::{ClientFilter, CrmStorage, retry};
use crate::errors::{CrmError, Result};
use crate::storage::models::Client;

use migration::entities::client;

fn client_condition(filter: &ClientFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(status) = filter.status {
        condition = condition.add(client::Column::Status.eq(status.to_string()));
    }
    if let Some(ref branch) = filter.branch {
        condition = condition.add(client::Column::Branch.eq(branch.clone()));
    }
    if let Some(ref search) = filter.search {
        condition = condition.add(
            Condition::any()
                .add(client::Column::Name.contains(search))
                .add(client::Column::Phone.contains(search)),
        );
    }
    condition
}

impl CrmStorage {
    pub async fn insert_client(&self, client: &Client) -> Result<Client> {
        let model = client_to_active_model(client, true)
            .insert(&self.db)
            .await
            .map_err(|e| CrmError::insert_failed(e, "Client"))?;
        self.invalidate_count_cache();
        model_to_client(model)
    }

    pub async fn get_client(&self, client_id: i64) -> Result<Option<Client>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("get_client({})", client_id),
            self.retry_config,
            || async { client::Entity::find_by_id(client_id).one(db).await },
        )
        .await?;
        model.map(model_to_client).transpose()
    }

    pub async fn update_client(&self, client: &Client) -> Result<Client> {
        let model = client_to_active_model(client, false)
            .update(&self.db)
            .await
            .map_err(|e| {
                CrmError::database_operation(format!(
                    "Failed to update client {}: {}",
                    client.client_id, e
                ))
            })?;
        self.invalidate_count_cache();
        model_to_client(model)
    }

    pub async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Client>, u64)> {
        let db = &self.db;
        let condition = client_condition(filter);

        let total = self
            .cached_count(format!("clients:{:?}", filter), || async {
                client::Entity::find()
                    .filter(condition.clone())
                    .count(db)
                    .await
            })
            .await?;

        let models = retry::with_retry("list_clients", self.retry_config, || async {
            client::Entity::find()
                .filter(condition.clone())
                .order_by_asc(client::Column::Name)
                .order_by_asc(client::Column::ClientId)
                .paginate(db, page_size)
                .fetch_page(page.saturating_sub(1))
                .await
        })
        .await?;

        let clients = models
            .into_iter()
            .map(model_to_client)
            .collect::<Result<Vec<_>>>()?;
        Ok((clients, total))
    }
}
