pub mod http;
pub mod memory;

pub use http::HttpLeadApi;
pub use memory::InMemoryLeadApi;

use async_trait::async_trait;
use shared_types::{CreateLeadRequest, Lead, LeadsResponse, ListLeadsQuery, UpdateLeadRequest};

use crate::error::LeadApiError;

/// Contract of the remote lead-management API.
///
/// Deletes are soft: a deleted lead is excluded from later `list` and `get`
/// results but the API keeps the record.
#[async_trait]
pub trait LeadApi: Send + Sync {
    async fn list(&self, query: &ListLeadsQuery) -> Result<LeadsResponse, LeadApiError>;
    async fn get(&self, id: &str) -> Result<Lead, LeadApiError>;
    async fn create(&self, request: &CreateLeadRequest) -> Result<Lead, LeadApiError>;
    async fn update(&self, id: &str, request: &UpdateLeadRequest) -> Result<Lead, LeadApiError>;
    async fn assign(&self, id: &str, agent_id: &str) -> Result<Lead, LeadApiError>;
    async fn delete(&self, id: &str) -> Result<(), LeadApiError>;
}
