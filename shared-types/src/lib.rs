use serde::{Deserialize, Serialize};

pub mod lead;
pub mod stage;

pub use lead::{
    AssignLeadRequest, AssigneeSummary, CreateLeadRequest, Lead, LeadsResponse, ListLeadsQuery,
    Pagination, UpdateLeadRequest,
};
pub use stage::{LeadPriority, LeadStage, ParseRegistryError};

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
