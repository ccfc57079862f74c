use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;

use super::lead_service::{clean, clean_email, normalize_phone};
use crate::api::services::crm::TS_EXPORT_PATH;
use crate::errors::{CrmError, Result};
use crate::storage::{Client, ClientFilter, ClientStatus, CrmStorage};

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreateClientRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub id_proof: Option<String>,
    pub branch: Option<String>,
    pub status: Option<ClientStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub id_proof: Option<String>,
    pub branch: Option<String>,
    pub status: Option<ClientStatus>,
}

pub struct ClientService {
    storage: Arc<CrmStorage>,
}

impl ClientService {
    pub fn new(storage: Arc<CrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn create_client(&self, req: CreateClientRequest) -> Result<Client> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(CrmError::validation("Client name is required"));
        }

        let now = Utc::now();
        let client = Client {
            client_id: 0,
            name,
            phone: normalize_phone(&req.phone)?,
            email: clean_email(req.email)?,
            address: clean(req.address),
            id_proof: clean(req.id_proof),
            branch: clean(req.branch),
            status: req.status.unwrap_or(ClientStatus::Active),
            lead_id: None,
            created_at: now,
            updated_at: now,
        };

        let client = self.storage.insert_client(&client).await?;
        info!("ClientService: created client {} ({})", client.client_id, client.name);
        Ok(client)
    }

    pub async fn get_client(&self, client_id: i64) -> Result<Client> {
        self.storage
            .get_client(client_id)
            .await?
            .ok_or_else(|| CrmError::not_found(format!("Client {} not found", client_id)))
    }

    pub async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Client>, u64)> {
        self.storage
            .list_clients(filter, page.max(1), page_size.clamp(1, 100))
            .await
    }

    pub async fn update_client(&self, client_id: i64, req: UpdateClientRequest) -> Result<Client> {
        let mut client = self.get_client(client_id).await?;

        if let Some(name) = req.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CrmError::validation("Client name cannot be empty"));
            }
            client.name = name;
        }
        if let Some(phone) = req.phone {
            client.phone = normalize_phone(&phone)?;
        }
        if req.email.is_some() {
            client.email = clean_email(req.email)?;
        }
        if req.address.is_some() {
            client.address = clean(req.address);
        }
        if req.id_proof.is_some() {
            client.id_proof = clean(req.id_proof);
        }
        if req.branch.is_some() {
            client.branch = clean(req.branch);
        }
        if let Some(status) = req.status {
            client.status = status;
        }
        client.updated_at = Utc::now();

        let client = self.storage.update_client(&client).await?;
        info!("ClientService: updated client {}", client_id);
        Ok(client)
    }
}
