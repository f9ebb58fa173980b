use async_trait::async_trait;
use chrono::Utc;
use shared_types::{
    AssigneeSummary, CreateLeadRequest, Lead, LeadPriority, LeadStage, LeadsResponse,
    ListLeadsQuery, Pagination, UpdateLeadRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

use super::LeadApi;
use crate::error::LeadApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Assign,
    Delete,
}

/// A request the backend received, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub lead_id: Option<String>,
    pub update: Option<UpdateLeadRequest>,
}

struct StoredLead {
    lead: Lead,
    deleted: bool,
}

struct InjectedFailure {
    operation: Operation,
    lead_id: Option<String>,
    error: LeadApiError,
}

#[derive(Default)]
struct BackendState {
    leads: Vec<StoredLead>,
    agents: HashMap<String, AssigneeSummary>,
    failures: Vec<InjectedFailure>,
    calls: Vec<RecordedCall>,
    list_gate: Option<oneshot::Receiver<()>>,
}

impl BackendState {
    fn record(&mut self, operation: Operation, lead_id: Option<&str>, update: Option<&UpdateLeadRequest>) {
        self.calls.push(RecordedCall {
            operation,
            lead_id: lead_id.map(str::to_string),
            update: update.cloned(),
        });
    }

    fn take_failure(&mut self, operation: Operation, lead_id: Option<&str>) -> Option<LeadApiError> {
        let index = self.failures.iter().position(|failure| {
            failure.operation == operation
                && match (&failure.lead_id, lead_id) {
                    (None, _) => true,
                    (Some(expected), Some(actual)) => expected == actual,
                    (Some(_), None) => false,
                }
        })?;
        Some(self.failures.remove(index).error)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut StoredLead> {
        self.leads.iter_mut().find(|stored| stored.lead.id == id)
    }

    fn live_lead_mut(&mut self, id: &str) -> Result<&mut Lead, LeadApiError> {
        match self.find_mut(id) {
            Some(stored) if stored.deleted => Err(LeadApiError::Conflict(format!(
                "Lead {} was deleted",
                id
            ))),
            Some(stored) => Ok(&mut stored.lead),
            None => Err(LeadApiError::NotFound(format!("Lead {} not found", id))),
        }
    }
}

/// In-process implementation of the lead API.
///
/// Backs the CLI demo mode and the test suite. Supports failure injection,
/// holding a list response until released, and a log of received calls.
#[derive(Clone, Default)]
pub struct InMemoryLeadApi {
    state: Arc<Mutex<BackendState>>,
}

impl InMemoryLeadApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend seeded with a small sample pipeline and three agents.
    pub async fn with_demo_data() -> Result<Self, LeadApiError> {
        let api = Self::new();
        api.add_agent("agent_sara", "Sara Khan", Some("sara@agency.test")).await;
        api.add_agent("agent_omar", "Omar Nasser", Some("omar@agency.test")).await;
        api.add_agent("agent_lina", "Lina Haddad", None).await;

        let samples: [(&str, &str, &str, LeadStage, LeadPriority, Option<f64>); 9] = [
            ("Amira Saleh", "amira@example.com", "WEBSITE", LeadStage::NewLead, LeadPriority::High, None),
            ("Daniel Brooks", "daniel@example.com", "REFERRAL", LeadStage::NewLead, LeadPriority::Low, None),
            ("Priya Nair", "priya@example.com", "PORTAL", LeadStage::Contacted, LeadPriority::Medium, None),
            ("Yusuf Demir", "yusuf@example.com", "WEBSITE", LeadStage::Qualified, LeadPriority::Urgent, Some(1_250_000.0)),
            ("Elena Petrova", "elena@example.com", "WALK_IN", LeadStage::ViewingScheduled, LeadPriority::High, Some(890_000.0)),
            ("Marco Rossi", "marco@example.com", "REFERRAL", LeadStage::Negotiation, LeadPriority::Urgent, Some(2_100_000.0)),
            ("Fatima Zahra", "fatima@example.com", "SOCIAL", LeadStage::Negotiation, LeadPriority::Medium, Some(640_000.0)),
            ("Chen Wei", "chen@example.com", "PORTAL", LeadStage::DealClosedWon, LeadPriority::High, Some(1_780_000.0)),
            ("Hannah Schmidt", "hannah@example.com", "WEBSITE", LeadStage::DealClosedLost, LeadPriority::Low, Some(520_000.0)),
        ];

        for (name, email, source, stage, priority, deal_value) in samples {
            let request = CreateLeadRequest {
                name: name.to_string(),
                email: Some(email.to_string()),
                phone: Some("+971 50 123 4567".to_string()),
                city: Some("Dubai".to_string()),
                source: Some(source.to_string()),
                stage: Some(stage),
                priority: Some(priority),
                deal_value,
                ..Default::default()
            };
            api.create(&request).await?;
        }

        Ok(api)
    }

    pub async fn add_agent(&self, id: &str, name: &str, email: Option<&str>) {
        let mut state = self.state.lock().await;
        state.agents.insert(
            id.to_string(),
            AssigneeSummary {
                id: id.to_string(),
                name: name.to_string(),
                email: email.map(str::to_string),
            },
        );
    }

    /// Makes the next matching call fail with `error`. `lead_id` narrows
    /// the failure to a single lead; `None` matches any.
    pub async fn fail_next(&self, operation: Operation, lead_id: Option<&str>, error: LeadApiError) {
        let mut state = self.state.lock().await;
        state.failures.push(InjectedFailure {
            operation,
            lead_id: lead_id.map(str::to_string),
            error,
        });
    }

    /// Holds the next `list` response until the returned sender fires or is
    /// dropped. The response reflects the data as of the moment the request
    /// arrived.
    pub async fn hold_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().await;
        state.list_gate = Some(rx);
        tx
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self, operation: Operation) -> usize {
        let state = self.state.lock().await;
        state
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Soft-deleted leads are kept; this reports whether `id` is one of them.
    pub async fn is_deleted(&self, id: &str) -> bool {
        let state = self.state.lock().await;
        state
            .leads
            .iter()
            .any(|stored| stored.lead.id == id && stored.deleted)
    }
}

/// Stand-in for the API's lead scoring: priority weight plus profile completeness.
fn score(lead: &Lead) -> f64 {
    let base = match lead.priority {
        LeadPriority::Low => 10.0,
        LeadPriority::Medium => 25.0,
        LeadPriority::High => 40.0,
        LeadPriority::Urgent => 55.0,
    };
    let completeness = [
        lead.email.is_some(),
        lead.phone.is_some(),
        lead.max_price.is_some() || lead.deal_value.is_some(),
        lead.requirements.is_some(),
    ]
    .into_iter()
    .filter(|present| *present)
    .count() as f64;

    (base + completeness * 11.25).min(100.0)
}

fn ensure_known_stage(stage: Option<LeadStage>) -> Result<(), LeadApiError> {
    match stage {
        Some(stage) if !stage.is_known() => Err(LeadApiError::Validation(format!(
            "Invalid stage value: {}",
            stage
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl LeadApi for InMemoryLeadApi {
    async fn list(&self, query: &ListLeadsQuery) -> Result<LeadsResponse, LeadApiError> {
        let (response, gate) = {
            let mut state = self.state.lock().await;
            state.record(Operation::List, None, None);
            if let Some(error) = state.take_failure(Operation::List, None) {
                return Err(error);
            }

            let matching: Vec<Lead> = state
                .leads
                .iter()
                .filter(|stored| !stored.deleted && query.matches(&stored.lead))
                .map(|stored| stored.lead.clone())
                .collect();

            let total = matching.len() as u32;
            let leads: Vec<Lead> = if query.limit == 0 {
                matching.into_iter().skip(query.offset as usize).collect()
            } else {
                matching
                    .into_iter()
                    .skip(query.offset as usize)
                    .take(query.limit as usize)
                    .collect()
            };

            let response = LeadsResponse {
                leads,
                pagination: Pagination {
                    total,
                    offset: query.offset,
                    limit: query.limit,
                },
            };
            (response, state.list_gate.take())
        };

        if let Some(gate) = gate {
            // A dropped sender releases the response as well.
            let _ = gate.await;
        }

        Ok(response)
    }

    async fn get(&self, id: &str) -> Result<Lead, LeadApiError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Get, Some(id), None);
        if let Some(error) = state.take_failure(Operation::Get, Some(id)) {
            return Err(error);
        }

        match state.find_mut(id) {
            Some(stored) if !stored.deleted => Ok(stored.lead.clone()),
            _ => Err(LeadApiError::NotFound(format!("Lead {} not found", id))),
        }
    }

    async fn create(&self, request: &CreateLeadRequest) -> Result<Lead, LeadApiError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Create, None, None);
        if let Some(error) = state.take_failure(Operation::Create, None) {
            return Err(error);
        }

        if request.name.trim().is_empty() {
            return Err(LeadApiError::Validation("Lead name is required".to_string()));
        }
        ensure_known_stage(request.stage)?;

        let now = Utc::now();
        let mut lead = Lead {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            alternate_phone: request.alternate_phone.clone(),
            city: request.city.clone(),
            localities: request.localities.clone(),
            property_type_id: request.property_type_id.clone(),
            purpose: request.purpose.clone(),
            min_price: request.min_price,
            max_price: request.max_price,
            bedrooms: request.bedrooms.clone(),
            source: request.source.clone(),
            stage: request.stage.unwrap_or(LeadStage::NewLead),
            priority: request.priority.unwrap_or_default(),
            score: 0.0,
            deal_value: request.deal_value,
            assigned_to_id: None,
            assigned_to: None,
            tags: request.tags.clone(),
            requirements: request.requirements.clone(),
            created_at: now,
            updated_at: now,
        };
        lead.score = score(&lead);

        state.leads.push(StoredLead {
            lead: lead.clone(),
            deleted: false,
        });
        Ok(lead)
    }

    async fn update(&self, id: &str, request: &UpdateLeadRequest) -> Result<Lead, LeadApiError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Update, Some(id), Some(request));
        if let Some(error) = state.take_failure(Operation::Update, Some(id)) {
            return Err(error);
        }
        ensure_known_stage(request.stage)?;

        let lead = state.live_lead_mut(id)?;
        if let Some(name) = &request.name {
            lead.name = name.clone();
        }
        if let Some(email) = &request.email {
            lead.email = Some(email.clone());
        }
        if let Some(phone) = &request.phone {
            lead.phone = Some(phone.clone());
        }
        if let Some(city) = &request.city {
            lead.city = Some(city.clone());
        }
        if let Some(source) = &request.source {
            lead.source = Some(source.clone());
        }
        if let Some(stage) = request.stage {
            lead.stage = stage;
        }
        if let Some(priority) = request.priority {
            lead.priority = priority;
        }
        if let Some(deal_value) = request.deal_value {
            lead.deal_value = Some(deal_value);
        }
        if let Some(tags) = &request.tags {
            lead.tags = tags.clone();
        }
        if let Some(requirements) = &request.requirements {
            lead.requirements = Some(requirements.clone());
        }
        lead.score = score(lead);
        lead.updated_at = Utc::now();

        Ok(lead.clone())
    }

    async fn assign(&self, id: &str, agent_id: &str) -> Result<Lead, LeadApiError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Assign, Some(id), None);
        if let Some(error) = state.take_failure(Operation::Assign, Some(id)) {
            return Err(error);
        }

        let agent = state
            .agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| LeadApiError::NotFound(format!("Agent {} not found", agent_id)))?;

        let lead = match state.find_mut(id) {
            Some(stored) if !stored.deleted => &mut stored.lead,
            _ => return Err(LeadApiError::NotFound(format!("Lead {} not found", id))),
        };
        lead.assigned_to_id = Some(agent.id.clone());
        lead.assigned_to = Some(agent);
        lead.updated_at = Utc::now();

        Ok(lead.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), LeadApiError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Delete, Some(id), None);
        if let Some(error) = state.take_failure(Operation::Delete, Some(id)) {
            return Err(error);
        }

        match state.find_mut(id) {
            Some(stored) if !stored.deleted => {
                stored.deleted = true;
                stored.lead.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(LeadApiError::NotFound(format!("Lead {} not found", id))),
        }
    }
}
