use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::stage::{LeadPriority, LeadStage};

/// Agent a lead is assigned to, as resolved by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

/// Prospective client inquiry tracked through the sales pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub alternate_phone: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub localities: Vec<String>,
    pub property_type_id: Option<String>,
    pub purpose: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<String>,
    pub source: Option<String>,
    pub stage: LeadStage,
    pub priority: LeadPriority,
    /// Computed by the API, never written by clients.
    #[serde(default)]
    pub score: f64,
    pub deal_value: Option<f64>,
    pub assigned_to_id: Option<String>,
    pub assigned_to: Option<AssigneeSummary>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub requirements: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new lead
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub localities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<LeadStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<LeadPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

/// Partial update of a lead. Absent fields are left untouched by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<LeadStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<LeadPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

impl UpdateLeadRequest {
    /// Body sent when a card is dropped onto another Kanban column.
    pub fn stage(stage: LeadStage) -> Self {
        Self {
            stage: Some(stage),
            ..Default::default()
        }
    }
}

/// Request to assign a lead to an agent
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AssignLeadRequest {
    pub agent_id: String,
}

/// Pagination block returned alongside a lead page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.total
    }
}

/// Response containing a page of leads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeadsResponse {
    pub leads: Vec<Lead>,
    pub pagination: Pagination,
}

/// Query string of `GET /leads`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ListLeadsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<LeadStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<LeadPriority>,
    pub offset: u32,
    pub limit: u32,
}

impl ListLeadsQuery {
    /// Conjunction of the filter dimensions; an absent dimension matches all.
    pub fn matches(&self, lead: &Lead) -> bool {
        self.matches_search(lead)
            && self
                .source
                .as_deref()
                .map_or(true, |source| lead.source.as_deref() == Some(source))
            && self.stage.map_or(true, |stage| lead.stage == stage)
            && self.priority.map_or(true, |priority| lead.priority == priority)
    }

    fn matches_search(&self, lead: &Lead) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => term.to_lowercase(),
            _ => return true,
        };

        [Some(lead.name.as_str()), lead.email.as_deref(), lead.phone.as_deref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lead(id: &str, name: &str, priority: LeadPriority) -> Lead {
        let now = Utc::now();
        Lead {
            id: id.to_string(),
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            phone: Some("+971500000000".to_string()),
            alternate_phone: None,
            city: Some("Dubai".to_string()),
            localities: vec!["Marina".to_string()],
            property_type_id: None,
            purpose: Some("BUY".to_string()),
            min_price: None,
            max_price: None,
            bedrooms: None,
            source: Some("WEBSITE".to_string()),
            stage: LeadStage::NewLead,
            priority,
            score: 10.0,
            deal_value: None,
            assigned_to_id: None,
            assigned_to: None,
            tags: vec![],
            requirements: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_lead_wire_format() {
        let json = r#"{
            "id": "lead_1",
            "name": "Amira Haddad",
            "email": "amira@example.com",
            "phone": null,
            "alternatePhone": null,
            "city": "Dubai",
            "localities": ["JLT"],
            "propertyTypeId": "apt",
            "purpose": "RENT",
            "minPrice": 50000,
            "maxPrice": 90000,
            "bedrooms": "2",
            "source": "REFERRAL",
            "stage": "VIEWING_SCHEDULED",
            "priority": "HIGH",
            "score": 72,
            "dealValue": null,
            "assignedToId": "agent_9",
            "assignedTo": {"id": "agent_9", "name": "Omar", "email": null},
            "tags": ["hot"],
            "requirements": "Near metro",
            "createdAt": "2026-03-01T10:00:00Z",
            "updatedAt": "2026-03-02T10:00:00Z"
        }"#;

        let lead: Lead = serde_json::from_str(json).unwrap();
        assert_eq!(lead.stage, LeadStage::ViewingScheduled);
        assert_eq!(lead.priority, LeadPriority::High);
        assert_eq!(lead.assigned_to.as_ref().unwrap().name, "Omar");
        assert_eq!(lead.score, 72.0);

        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(value["assignedToId"], "agent_9");
        assert_eq!(value["stage"], "VIEWING_SCHEDULED");
    }

    #[test]
    fn test_stage_update_body_is_partial() {
        let body = serde_json::to_value(UpdateLeadRequest::stage(LeadStage::Qualified)).unwrap();
        assert_eq!(body, serde_json::json!({ "stage": "QUALIFIED" }));
    }

    #[test]
    fn test_query_search_is_case_insensitive() {
        let lead = sample_lead("1", "Amira", LeadPriority::Low);
        let query = ListLeadsQuery {
            search: Some("AMI".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&lead));

        let query = ListLeadsQuery {
            search: Some("0000".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&lead));

        let query = ListLeadsQuery {
            search: Some("zed".to_string()),
            ..Default::default()
        };
        assert!(!query.matches(&lead));
    }

    #[test]
    fn test_query_dimensions_are_conjunctive() {
        let lead = sample_lead("1", "Amira", LeadPriority::Urgent);
        let query = ListLeadsQuery {
            priority: Some(LeadPriority::Urgent),
            source: Some("WEBSITE".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&lead));

        let query = ListLeadsQuery {
            priority: Some(LeadPriority::Urgent),
            stage: Some(LeadStage::Contacted),
            ..Default::default()
        };
        assert!(!query.matches(&lead));
    }

    #[test]
    fn test_pagination_has_next() {
        let page = Pagination {
            total: 45,
            offset: 40,
            limit: 20,
        };
        assert!(!page.has_next());
        let page = Pagination {
            total: 45,
            offset: 20,
            limit: 20,
        };
        assert!(page.has_next());
    }
}
