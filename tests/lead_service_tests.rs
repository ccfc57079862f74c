//! 线索、客户转化与用户账号测试

mod common;

use rust_decimal_macros::dec;

use common::{TEST_PASSWORD, create_user, lead_request, loan_request, test_env};
use loan_crm::config::AuthConfig;
use loan_crm::errors::CrmError;
use loan_crm::services::{
    ConvertLeadRequest, ImportMode, UpdateLeadRequest, UpdateUserRequest,
};
use loan_crm::storage::{ClientFilter, LeadFilter, LeadStatus, UserRole, UserStatus};
use loan_crm::utils::csv_handler::{read_lead_rows, write_leads};

#[tokio::test]
async fn test_create_and_search_leads() {
    let env = test_env().await;
    let lead = env
        .services
        .leads
        .create_lead(lead_request("Sunita Patil", "+91 98220-12345"))
        .await
        .unwrap();
    assert_eq!(lead.phone, "+919822012345");
    assert_eq!(lead.status, LeadStatus::Open);
    env.services
        .leads
        .create_lead(lead_request("Arjun Rao", "9000011111"))
        .await
        .unwrap();

    let (found, total) = env
        .services
        .leads
        .list_leads(
            &LeadFilter {
                search: Some("sunita".to_string()),
                ..LeadFilter::default()
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].lead_id, lead.lead_id);

    let err = env
        .services
        .leads
        .create_lead(lead_request("No Phone", "12ab"))
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
}

#[tokio::test]
async fn test_convert_lead_creates_linked_client() {
    let env = test_env().await;
    let lead = env
        .services
        .leads
        .create_lead(lead_request("Kavita Joshi", "9876543210"))
        .await
        .unwrap();

    let (converted, client) = env
        .services
        .leads
        .convert_lead(
            lead.lead_id,
            ConvertLeadRequest {
                address: Some("12 MG Road, Nashik".to_string()),
                id_proof: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(converted.status, LeadStatus::Converted);
    assert_eq!(converted.client_id, Some(client.client_id));
    assert_eq!(client.lead_id, Some(lead.lead_id));
    assert_eq!(client.phone, "9876543210");
    assert_eq!(client.address.as_deref(), Some("12 MG Road, Nashik"));

    let err = env
        .services
        .leads
        .convert_lead(lead.lead_id, ConvertLeadRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Conflict(_)));

    // 转化后的客户可以关联贷款
    let mut req = loan_request("LN-CLIENT");
    req.client_id = Some(client.client_id);
    let loan = env.services.loans.create_loan(req).await.unwrap().loan;
    assert_eq!(loan.client_id, Some(client.client_id));

    let (clients, total) = env
        .services
        .clients
        .list_clients(&ClientFilter::default(), 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(clients[0].name, "Kavita Joshi");
}

#[tokio::test]
async fn test_rejected_lead_cannot_convert() {
    let env = test_env().await;
    let lead = env
        .services
        .leads
        .create_lead(lead_request("Mohan Das", "9123456789"))
        .await
        .unwrap();
    env.services
        .leads
        .update_lead(
            lead.lead_id,
            UpdateLeadRequest {
                status: Some(LeadStatus::Rejected),
                ..UpdateLeadRequest::default()
            },
        )
        .await
        .unwrap();

    let err = env
        .services
        .leads
        .convert_lead(lead.lead_id, ConvertLeadRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::InvalidState(_)));
}

#[tokio::test]
async fn test_unknown_client_is_rejected_on_loan_create() {
    let env = test_env().await;
    let mut req = loan_request("LN-NOCLIENT");
    req.client_id = Some(4242);
    let err = env.services.loans.create_loan(req).await.unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
}

#[tokio::test]
async fn test_lead_import_keys_on_phone() {
    let env = test_env().await;
    env.services
        .leads
        .create_lead(lead_request("Existing", "9988776655"))
        .await
        .unwrap();

    let csv = "\
name,phone,email,requested_amount,branch,status
Existing Updated,99887-76655,,30000,Pune,In Process
New Lead,9811122233,new@example.com,\"40,000\",Pune,
Bad Phone,123,,,Pune,
";
    let result = env
        .services
        .leads
        .import_leads(read_lead_rows(csv.as_bytes()).unwrap(), ImportMode::Overwrite)
        .await;
    assert_eq!(result.total_rows, 3);
    assert_eq!(result.success_count, 2);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.failed_items[0].key, "123");

    let leads = env
        .services
        .leads
        .export_leads(&LeadFilter::default())
        .await
        .unwrap();
    assert_eq!(leads.len(), 2);
    let updated = leads.iter().find(|l| l.phone == "9988776655").unwrap();
    assert_eq!(updated.name, "Existing Updated");
    assert_eq!(updated.status, LeadStatus::InProcess);
    let added = leads.iter().find(|l| l.phone == "9811122233").unwrap();
    assert_eq!(added.requested_amount, Some(dec!(40000)));

    let mut buf = Vec::new();
    write_leads(&mut buf, &leads).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("name,phone,email"));
    assert!(text.contains("New Lead"));
}

#[tokio::test]
async fn test_authenticate_and_deactivate_user() {
    let env = test_env().await;
    let user = create_user(&env.services, "Collector@Example.com", UserRole::Employee).await;
    assert_eq!(user.email, "collector@example.com");

    let signed_in = env
        .services
        .users
        .authenticate("collector@example.com", TEST_PASSWORD)
        .await
        .unwrap();
    assert!(signed_in.last_login_at.is_some());

    let wrong = env
        .services
        .users
        .authenticate("collector@example.com", "nope-nope")
        .await
        .unwrap_err();
    let unknown = env
        .services
        .users
        .authenticate("ghost@example.com", TEST_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(wrong, CrmError::Unauthorized(_)));
    assert_eq!(wrong.message(), unknown.message());

    env.services
        .users
        .update_user(
            user.user_id,
            UpdateUserRequest {
                status: Some(UserStatus::Inactive),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();
    let err = env
        .services
        .users
        .authenticate("collector@example.com", TEST_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Forbidden(_)));

    let err = env
        .services
        .users
        .create_user(loan_crm::services::CreateUserRequest {
            name: "Dup".to_string(),
            email: "collector@example.com".to_string(),
            password: TEST_PASSWORD.to_string(),
            role: UserRole::Manager,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Conflict(_)));
}

#[tokio::test]
async fn test_bootstrap_admin_only_on_empty_table() {
    let env = test_env().await;
    let auth = AuthConfig {
        bootstrap_admin_email: Some("root@example.com".to_string()),
        bootstrap_admin_password: Some(TEST_PASSWORD.to_string()),
        ..AuthConfig::default()
    };

    let created = env.services.users.bootstrap_admin(&auth).await.unwrap();
    assert_eq!(created.map(|u| u.role), Some(UserRole::Admin));

    let again = env.services.users.bootstrap_admin(&auth).await.unwrap();
    assert!(again.is_none());
}
