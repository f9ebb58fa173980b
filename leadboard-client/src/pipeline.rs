use shared_types::{
    CreateLeadRequest, Lead, LeadPriority, LeadStage, LeadsResponse, ListLeadsQuery, Pagination,
};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::board::Board;
use crate::bulk::{BulkCoordinator, BulkReport};
use crate::drag::{DragController, DragState, DropResolution, GestureError, StageChange};
use crate::error::{ClientError, LeadApiError};
use crate::filter::LeadFilter;
use crate::notify::Notifier;
use crate::selection::SelectionSet;
use crate::sync::LeadSync;

/// Per-operation loading flags; the view stays usable while any is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub list: bool,
    pub stage_update: bool,
    pub bulk: bool,
    pub assign: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer list request was issued while this one was pending.
    Superseded,
    Detached,
    Failed(LeadApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    NoOp,
    Cancelled,
    Moved(Lead),
    Failed {
        change: StageChange,
        error: LeadApiError,
    },
    /// The request completed after the view was unmounted.
    Detached,
}

struct ViewState {
    filter: LeadFilter,
    selection: SelectionSet,
    drag: DragController,
    page: Option<LeadsResponse>,
    /// Query the current page was fetched with.
    page_query: Option<ListLeadsQuery>,
    loading: LoadingFlags,
    list_seq: u64,
    mounted: bool,
}

/// Kanban pipeline view: filter, selection, drag and bulk state over the
/// shared lead cache.
///
/// Methods take `&self` so UI events and network completions can interleave.
/// The state lock is never held across a remote call.
pub struct PipelineView {
    sync: Arc<LeadSync>,
    bulk: BulkCoordinator,
    notifier: Notifier,
    state: Arc<Mutex<ViewState>>,
}

impl PipelineView {
    pub fn new(sync: Arc<LeadSync>, notifier: Notifier, page_size: u32) -> Self {
        Self {
            bulk: BulkCoordinator::new(sync.clone()),
            sync,
            notifier,
            state: Arc::new(Mutex::new(ViewState {
                filter: LeadFilter::new(page_size),
                selection: SelectionSet::new(),
                drag: DragController::new(),
                page: None,
                page_query: None,
                loading: LoadingFlags::default(),
                list_seq: 0,
                mounted: true,
            })),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn filter(&self) -> LeadFilter {
        self.state.lock().await.filter.clone()
    }

    pub async fn loading(&self) -> LoadingFlags {
        self.state.lock().await.loading
    }

    pub async fn selection(&self) -> SelectionSet {
        self.state.lock().await.selection.clone()
    }

    pub async fn drag_state(&self) -> DragState {
        self.state.lock().await.drag.state().clone()
    }

    pub async fn in_flight(&self) -> Option<StageChange> {
        self.state.lock().await.drag.in_flight().cloned()
    }

    pub async fn leads(&self) -> Vec<Lead> {
        let state = self.state.lock().await;
        state
            .page
            .as_ref()
            .map(|page| page.leads.clone())
            .unwrap_or_default()
    }

    pub async fn pagination(&self) -> Option<Pagination> {
        let state = self.state.lock().await;
        state.page.as_ref().map(|page| page.pagination)
    }

    /// Current page grouped into stage columns. Cards stay in their last
    /// fetched column until a refetch moves them.
    pub async fn board(&self) -> Board {
        let state = self.state.lock().await;
        match &state.page {
            Some(page) => Board::from_leads(&page.leads),
            None => Board::from_leads(&[]),
        }
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.load(false).await
    }

    /// Fetches the page for the current filter.
    ///
    /// After a mutation the page is always refetched from the API and the
    /// selection keeps only listed ids. A plain refresh of the same query
    /// drops selected ids that vanished from the page; ids selected on
    /// other pages are kept.
    async fn load(&self, after_mutation: bool) -> RefreshOutcome {
        let (query, seq) = {
            let mut state = self.state.lock().await;
            if !state.mounted {
                return RefreshOutcome::Detached;
            }
            state.list_seq += 1;
            state.loading.list = true;
            (state.filter.to_query(), state.list_seq)
        };

        let result = if after_mutation {
            self.sync.fetch_list(&query).await
        } else {
            self.sync.list(&query).await
        };

        let mut state = self.state.lock().await;
        if !state.mounted {
            return RefreshOutcome::Detached;
        }
        if seq != state.list_seq {
            tracing::debug!("Ignoring superseded lead list response #{}", seq);
            return RefreshOutcome::Superseded;
        }
        state.loading.list = false;

        match result {
            Ok(page) => {
                let pruned = if after_mutation {
                    state
                        .selection
                        .retain_listed(page.leads.iter().map(|lead| lead.id.as_str()))
                } else if state.page_query.as_ref() == Some(&query) {
                    let vanished = match &state.page {
                        Some(previous) => vanished_ids(previous, &page),
                        None => Vec::new(),
                    };
                    vanished
                        .iter()
                        .filter(|id| state.selection.remove(id))
                        .count()
                } else {
                    0
                };
                if pruned > 0 {
                    tracing::debug!("Pruned {} stale ids from selection", pruned);
                }
                state.page = Some(page);
                state.page_query = Some(query);
                RefreshOutcome::Applied
            }
            Err(e) => {
                drop(state);
                tracing::warn!("Failed to load leads: {}", e);
                self.notifier.error(format!("Failed to load leads: {}", e)).await;
                RefreshOutcome::Failed(e)
            }
        }
    }

    async fn update_filter(&self, change: impl FnOnce(&LeadFilter) -> LeadFilter) -> RefreshOutcome {
        {
            let mut state = self.state.lock().await;
            state.filter = change(&state.filter);
        }
        self.refresh().await
    }

    /// Replaces the whole filter, e.g. when a filter form is submitted.
    pub async fn apply_filter(&self, filter: LeadFilter) -> RefreshOutcome {
        self.update_filter(|_| filter).await
    }

    pub async fn set_search(&self, search: Option<String>) -> RefreshOutcome {
        self.update_filter(|filter| filter.with_search(search)).await
    }

    pub async fn set_source(&self, source: Option<String>) -> RefreshOutcome {
        self.update_filter(|filter| filter.with_source(source)).await
    }

    pub async fn set_stage(&self, stage: Option<LeadStage>) -> RefreshOutcome {
        self.update_filter(|filter| filter.with_stage(stage)).await
    }

    pub async fn set_priority(&self, priority: Option<LeadPriority>) -> RefreshOutcome {
        self.update_filter(|filter| filter.with_priority(priority)).await
    }

    pub async fn clear_filters(&self) -> RefreshOutcome {
        self.update_filter(LeadFilter::cleared).await
    }

    /// Moves to `offset` directly, e.g. from a page number link.
    pub async fn go_to_offset(&self, offset: u32) -> RefreshOutcome {
        self.update_filter(|filter| filter.with_offset(offset)).await
    }

    /// Returns `None` when already on the last page.
    pub async fn next_page(&self) -> Option<RefreshOutcome> {
        {
            let mut state = self.state.lock().await;
            let pagination = state.page.as_ref()?.pagination;
            state.filter = state.filter.next_page(&pagination)?;
        }
        Some(self.refresh().await)
    }

    pub async fn prev_page(&self) -> Option<RefreshOutcome> {
        {
            let mut state = self.state.lock().await;
            state.filter = state.filter.prev_page()?;
        }
        Some(self.refresh().await)
    }

    pub async fn toggle_selected(&self, lead_id: &str) -> bool {
        self.state.lock().await.selection.toggle(lead_id)
    }

    /// Select-all over the currently listed leads.
    pub async fn toggle_select_all(&self) {
        let mut state = self.state.lock().await;
        let ViewState {
            page, selection, ..
        } = &mut *state;
        let listed: Vec<&str> = page
            .iter()
            .flat_map(|page| page.leads.iter().map(|lead| lead.id.as_str()))
            .collect();
        selection.toggle_all(listed.iter().copied());
    }

    /// Picks up a card. The origin stage is the column the card is rendered in.
    pub async fn begin_drag(&self, lead_id: &str) -> Result<(), GestureError> {
        let mut state = self.state.lock().await;
        let origin = state
            .page
            .as_ref()
            .and_then(|page| page.leads.iter().find(|lead| lead.id == lead_id))
            .map(|lead| lead.stage)
            .ok_or_else(|| GestureError::LeadNotListed(lead_id.to_string()))?;
        state.drag.start(lead_id, origin)
    }

    pub async fn hover(&self, target: LeadStage) -> Result<(), GestureError> {
        self.state.lock().await.drag.hover(target)
    }

    pub async fn leave(&self) {
        self.state.lock().await.drag.leave();
    }

    pub async fn cancel_drag(&self) -> DropOutcome {
        self.state.lock().await.drag.cancel();
        DropOutcome::Cancelled
    }

    /// Releases the dragged card over the hovered column.
    ///
    /// Issues at most one stage update. Nothing is moved locally: on success
    /// the refetch moves the card, on failure it never left its column.
    pub async fn drop_card(&self) -> DropOutcome {
        let resolution = {
            let mut state = self.state.lock().await;
            if !state.mounted {
                return DropOutcome::Detached;
            }
            let resolution = state.drag.drop();
            if matches!(resolution, DropResolution::Change(_)) {
                state.loading.stage_update = true;
            }
            resolution
        };

        let change = match resolution {
            DropResolution::NoOp => return DropOutcome::NoOp,
            DropResolution::Cancelled => return DropOutcome::Cancelled,
            DropResolution::Change(change) => change,
        };

        let result = self.sync.update_stage(&change.lead_id, change.to).await;

        {
            let mut state = self.state.lock().await;
            if !state.mounted {
                return DropOutcome::Detached;
            }
            state.drag.complete();
            state.loading.stage_update = false;
        }

        match result {
            Ok(lead) => {
                self.notifier
                    .success(format!("{} moved to {}", lead.name, change.to.label()))
                    .await;
                self.load(true).await;
                DropOutcome::Moved(lead)
            }
            Err(error) => {
                tracing::warn!(
                    "Failed to move lead {} from {} to {}: {}",
                    change.lead_id,
                    change.from,
                    change.to,
                    error
                );
                self.notifier
                    .error(format!("Could not move lead: {}", error))
                    .await;
                if error.is_stale_lead() {
                    self.load(true).await;
                }
                DropOutcome::Failed { change, error }
            }
        }
    }

    /// Deletes every selected lead, then refetches once and clears the
    /// selection whatever the mix of results.
    pub async fn bulk_delete(&self) -> BulkReport {
        let ids = {
            let mut state = self.state.lock().await;
            if !state.mounted {
                return BulkReport::default();
            }
            state.loading.bulk = true;
            state.selection.ids()
        };
        if ids.is_empty() {
            self.state.lock().await.loading.bulk = false;
            return BulkReport::default();
        }

        let report = self.bulk.delete_all(&ids).await;

        {
            let mut state = self.state.lock().await;
            if !state.mounted {
                return report;
            }
            state.selection.clear();
            state.loading.bulk = false;
        }

        if report.is_success() {
            self.notifier.success(report.summary()).await;
        } else {
            self.notifier.error(report.summary()).await;
        }
        self.load(true).await;
        report
    }

    /// Assigns the single selected lead to `agent_id` and clears the selection.
    pub async fn assign_selected(&self, agent_id: &str) -> Result<Lead, ClientError> {
        let selection = {
            let mut state = self.state.lock().await;
            if !state.mounted {
                return Err(ClientError::Unmounted);
            }
            if state.selection.single().is_some() {
                state.loading.assign = true;
            }
            state.selection.clone()
        };

        let result = self.bulk.assign_single(&selection, agent_id).await;
        if matches!(result, Err(ClientError::PreconditionFailed(_))) {
            return result;
        }

        {
            let mut state = self.state.lock().await;
            if !state.mounted {
                return Err(ClientError::Unmounted);
            }
            state.selection.clear();
            state.loading.assign = false;
        }

        match &result {
            Ok(lead) => {
                let assignee = lead
                    .assigned_to
                    .as_ref()
                    .map(|agent| agent.name.as_str())
                    .unwrap_or(agent_id);
                self.notifier
                    .success(format!("{} assigned to {}", lead.name, assignee))
                    .await;
            }
            Err(e) => {
                tracing::warn!("Failed to assign lead: {}", e);
                self.notifier.error(format!("Could not assign lead: {}", e)).await;
            }
        }
        self.load(true).await;
        result
    }

    /// Submits the new-lead form.
    pub async fn create_lead(&self, request: &CreateLeadRequest) -> Result<Lead, ClientError> {
        match self.sync.create(request).await {
            Ok(lead) => {
                self.notifier.success(format!("Lead {} created", lead.name)).await;
                self.load(false).await;
                Ok(lead)
            }
            Err(e) => {
                tracing::warn!("Failed to create lead: {}", e);
                self.notifier.error(format!("Could not create lead: {}", e)).await;
                Err(e.into())
            }
        }
    }

    /// Detaches the view. Responses arriving later are ignored.
    pub async fn unmount(&self) {
        let mut state = self.state.lock().await;
        state.mounted = false;
        state.drag.cancel();
    }
}

/// Ids listed in `previous` but missing from `current`.
fn vanished_ids(previous: &LeadsResponse, current: &LeadsResponse) -> Vec<String> {
    previous
        .leads
        .iter()
        .filter(|lead| !current.leads.iter().any(|listed| listed.id == lead.id))
        .map(|lead| lead.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::Operation;
    use crate::api::{InMemoryLeadApi, LeadApi};

    struct Harness {
        api: InMemoryLeadApi,
        sync: Arc<LeadSync>,
        view: Arc<PipelineView>,
    }

    async fn harness() -> Harness {
        let api = InMemoryLeadApi::new();
        api.add_agent("agent_1", "Sara Khan", None).await;
        let sync = Arc::new(LeadSync::new(Arc::new(api.clone())));
        let view = Arc::new(PipelineView::new(sync.clone(), Notifier::new(), 50));
        Harness { api, sync, view }
    }

    async fn seed(api: &InMemoryLeadApi, name: &str, stage: LeadStage, priority: LeadPriority) -> Lead {
        api.create(&CreateLeadRequest {
            name: name.to_string(),
            stage: Some(stage),
            priority: Some(priority),
            ..Default::default()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_drop_on_same_stage_issues_no_update() {
        let h = harness().await;
        let lead = seed(&h.api, "Amira", LeadStage::Contacted, LeadPriority::High).await;
        h.view.refresh().await;

        h.view.begin_drag(&lead.id).await.unwrap();
        h.view.hover(LeadStage::Contacted).await.unwrap();

        assert_eq!(h.view.drop_card().await, DropOutcome::NoOp);
        assert_eq!(h.api.call_count(Operation::Update).await, 0);
        assert_eq!(h.view.drag_state().await, DragState::Idle);
    }

    #[tokio::test]
    async fn test_drop_on_other_stage_issues_exactly_one_update() {
        let h = harness().await;
        let lead = seed(&h.api, "Amira", LeadStage::Contacted, LeadPriority::High).await;
        h.view.refresh().await;

        h.view.begin_drag(&lead.id).await.unwrap();
        h.view.hover(LeadStage::Qualified).await.unwrap();
        h.view.hover(LeadStage::Negotiation).await.unwrap();
        let outcome = h.view.drop_card().await;

        assert!(matches!(outcome, DropOutcome::Moved(ref moved) if moved.stage == LeadStage::Negotiation));
        let updates: Vec<_> = h
            .api
            .calls()
            .await
            .into_iter()
            .filter(|call| call.operation == Operation::Update)
            .collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].lead_id.as_deref(), Some(lead.id.as_str()));
        assert_eq!(
            updates[0].update.as_ref().unwrap().stage,
            Some(LeadStage::Negotiation)
        );

        let board = h.view.board().await;
        assert_eq!(board.locate(&lead.id), Some(LeadStage::Negotiation));
        assert!(h.view.in_flight().await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_drag_issues_no_update() {
        let h = harness().await;
        let lead = seed(&h.api, "Amira", LeadStage::NewLead, LeadPriority::Low).await;
        h.view.refresh().await;

        h.view.begin_drag(&lead.id).await.unwrap();
        h.view.hover(LeadStage::Qualified).await.unwrap();
        h.view.leave().await;

        assert_eq!(h.view.drop_card().await, DropOutcome::Cancelled);
        assert_eq!(h.api.call_count(Operation::Update).await, 0);
    }

    #[tokio::test]
    async fn test_failed_move_leaves_card_in_origin() {
        let h = harness().await;
        let lead = seed(&h.api, "Amira", LeadStage::Contacted, LeadPriority::High).await;
        h.view.refresh().await;
        h.api
            .fail_next(
                Operation::Update,
                Some(&lead.id),
                LeadApiError::Network("offline".into()),
            )
            .await;

        h.view.begin_drag(&lead.id).await.unwrap();
        h.view.hover(LeadStage::Qualified).await.unwrap();
        let outcome = h.view.drop_card().await;

        assert!(matches!(outcome, DropOutcome::Failed { error: LeadApiError::Network(_), .. }));
        assert_eq!(h.view.board().await.locate(&lead.id), Some(LeadStage::Contacted));
        assert_eq!(h.view.drag_state().await, DragState::Idle);
        assert!(!h.view.loading().await.stage_update);

        let notes = h.view.notifier().drain().await;
        assert!(notes.iter().any(|n| n.message.contains("Could not move lead")));
    }

    #[tokio::test]
    async fn test_drag_after_concurrent_delete() {
        let h = harness().await;
        let l1 = seed(&h.api, "L1", LeadStage::Contacted, LeadPriority::High).await;
        seed(&h.api, "L2", LeadStage::Contacted, LeadPriority::Low).await;
        h.view.refresh().await;

        h.view.begin_drag(&l1.id).await.unwrap();
        h.view.hover(LeadStage::Negotiation).await.unwrap();
        // Another agent deletes the lead before the drop lands
        h.sync.delete(&l1.id).await.unwrap();

        let outcome = h.view.drop_card().await;

        match outcome {
            DropOutcome::Failed { error, .. } => assert!(error.is_stale_lead()),
            other => panic!("Expected failed move, got {:?}", other),
        }
        let board = h.view.board().await;
        assert_eq!(board.locate(&l1.id), None);
        assert_eq!(board.total_leads(), 1);
    }

    #[tokio::test]
    async fn test_priority_filter_scenario() {
        let h = harness().await;
        seed(&h.api, "A", LeadStage::NewLead, LeadPriority::Low).await;
        let b = seed(&h.api, "B", LeadStage::NewLead, LeadPriority::Urgent).await;
        seed(&h.api, "C", LeadStage::NewLead, LeadPriority::High).await;
        let d = seed(&h.api, "D", LeadStage::NewLead, LeadPriority::Urgent).await;

        h.view.set_priority(Some(LeadPriority::Urgent)).await;

        let ids: Vec<String> = h.view.leads().await.into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![b.id, d.id]);
    }

    #[tokio::test]
    async fn test_filter_change_resets_offset() {
        let h = harness().await;
        for i in 0..120 {
            seed(&h.api, &format!("Lead {}", i), LeadStage::NewLead, LeadPriority::Low).await;
        }
        h.view.refresh().await;
        h.view.next_page().await.unwrap();
        assert_eq!(h.view.filter().await.offset(), 50);

        h.view.set_search(Some("lead 1".into())).await;

        assert_eq!(h.view.filter().await.offset(), 0);
        assert_eq!(h.view.pagination().await.unwrap().offset, 0);
    }

    #[tokio::test]
    async fn test_select_all_toggle_law() {
        let h = harness().await;
        for name in ["A", "B", "C"] {
            seed(&h.api, name, LeadStage::NewLead, LeadPriority::Low).await;
        }
        h.view.refresh().await;
        let first = h.view.leads().await[0].id.clone();
        h.view.toggle_selected(&first).await;

        h.view.toggle_select_all().await;
        assert_eq!(h.view.selection().await.len(), 3);

        h.view.toggle_select_all().await;
        assert!(h.view.selection().await.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_clears_selection_on_partial_failure() {
        let h = harness().await;
        let a = seed(&h.api, "A", LeadStage::NewLead, LeadPriority::Low).await;
        let b = seed(&h.api, "B", LeadStage::NewLead, LeadPriority::Low).await;
        seed(&h.api, "C", LeadStage::NewLead, LeadPriority::Low).await;
        h.view.refresh().await;
        h.view.toggle_selected(&a.id).await;
        h.view.toggle_selected(&b.id).await;
        h.api
            .fail_next(Operation::Delete, Some(&b.id), LeadApiError::Remote {
                status: 500,
                message: "boom".into(),
            })
            .await;
        let lists_before = h.api.call_count(Operation::List).await;

        let report = h.view.bulk_delete().await;

        assert_eq!(report.summary(), "1 of 2 deletions failed");
        assert!(h.view.selection().await.is_empty());
        assert_eq!(h.api.call_count(Operation::List).await, lists_before + 1);
        let names: Vec<String> = h.view.leads().await.into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["B", "C"]);
        assert!(!h.view.loading().await.bulk);
    }

    #[tokio::test]
    async fn test_bulk_delete_refetches_when_every_delete_fails() {
        let h = harness().await;
        let a = seed(&h.api, "A", LeadStage::NewLead, LeadPriority::Low).await;
        let b = seed(&h.api, "B", LeadStage::NewLead, LeadPriority::Low).await;
        h.view.refresh().await;
        h.view.toggle_selected(&a.id).await;
        h.view.toggle_selected(&b.id).await;
        for id in [&a.id, &b.id] {
            h.api
                .fail_next(Operation::Delete, Some(id), LeadApiError::Network("offline".into()))
                .await;
        }
        let lists_before = h.api.call_count(Operation::List).await;

        let report = h.view.bulk_delete().await;

        assert_eq!(report.summary(), "2 of 2 deletions failed");
        assert!(h.view.selection().await.is_empty());
        assert_eq!(h.api.call_count(Operation::List).await, lists_before + 1);
        let names: Vec<String> = h.view.leads().await.into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_refresh_drops_selected_lead_deleted_elsewhere() {
        let h = harness().await;
        let a = seed(&h.api, "A", LeadStage::NewLead, LeadPriority::Low).await;
        let b = seed(&h.api, "B", LeadStage::NewLead, LeadPriority::Low).await;
        h.view.refresh().await;
        h.view.toggle_selected(&a.id).await;
        h.view.toggle_selected(&b.id).await;

        // Another view sharing the cache deletes A
        h.sync.delete(&a.id).await.unwrap();
        assert_eq!(h.view.refresh().await, RefreshOutcome::Applied);

        let selection = h.view.selection().await;
        assert!(!selection.contains(&a.id));
        assert!(selection.contains(&b.id));
    }

    #[tokio::test]
    async fn test_selection_survives_paging() {
        let h = harness().await;
        for i in 0..60 {
            seed(&h.api, &format!("Lead {}", i), LeadStage::NewLead, LeadPriority::Low).await;
        }
        h.view.refresh().await;
        let first = h.view.leads().await[0].id.clone();
        h.view.toggle_selected(&first).await;

        h.view.next_page().await.unwrap();
        h.view.prev_page().await.unwrap();

        assert!(h.view.selection().await.contains(&first));
    }

    #[tokio::test]
    async fn test_assign_selected_needs_exactly_one() {
        let h = harness().await;
        let a = seed(&h.api, "A", LeadStage::NewLead, LeadPriority::Low).await;
        let b = seed(&h.api, "B", LeadStage::NewLead, LeadPriority::Low).await;
        h.view.refresh().await;
        h.view.toggle_selected(&a.id).await;
        h.view.toggle_selected(&b.id).await;

        let result = h.view.assign_selected("agent_1").await;
        assert!(matches!(result, Err(ClientError::PreconditionFailed(_))));
        assert_eq!(h.view.selection().await.len(), 2);

        h.view.toggle_selected(&b.id).await;
        let lead = h.view.assign_selected("agent_1").await.unwrap();
        assert_eq!(lead.assigned_to_id.as_deref(), Some("agent_1"));
        assert!(h.view.selection().await.is_empty());
        assert_eq!(
            h.view.leads().await[0].assigned_to.as_ref().unwrap().name,
            "Sara Khan"
        );
    }

    #[tokio::test]
    async fn test_superseded_list_response_is_ignored() {
        let h = harness().await;
        seed(&h.api, "Low lead", LeadStage::NewLead, LeadPriority::Low).await;
        seed(&h.api, "Urgent lead", LeadStage::NewLead, LeadPriority::Urgent).await;

        let release = h.api.hold_next_list().await;
        let slow = {
            let view = h.view.clone();
            tokio::spawn(async move { view.refresh().await })
        };
        while h.api.call_count(Operation::List).await == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            h.view.set_priority(Some(LeadPriority::Urgent)).await,
            RefreshOutcome::Applied
        );
        release.send(()).unwrap();

        assert_eq!(slow.await.unwrap(), RefreshOutcome::Superseded);
        let names: Vec<String> = h.view.leads().await.into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Urgent lead"]);
        assert!(!h.view.loading().await.list);
    }

    #[tokio::test]
    async fn test_late_response_after_unmount_is_ignored() {
        let h = harness().await;
        seed(&h.api, "A", LeadStage::NewLead, LeadPriority::Low).await;

        let release = h.api.hold_next_list().await;
        let pending = {
            let view = h.view.clone();
            tokio::spawn(async move { view.refresh().await })
        };
        while h.api.call_count(Operation::List).await == 0 {
            tokio::task::yield_now().await;
        }

        h.view.unmount().await;
        release.send(()).unwrap();

        assert_eq!(pending.await.unwrap(), RefreshOutcome::Detached);
        assert!(h.view.leads().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_then_move_round_trip() {
        let h = harness().await;
        let lead = h
            .view
            .create_lead(&CreateLeadRequest {
                name: "Amira".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(lead.stage, LeadStage::NewLead);

        h.view.begin_drag(&lead.id).await.unwrap();
        h.view.hover(LeadStage::Qualified).await.unwrap();
        h.view.drop_card().await;

        assert_eq!(h.sync.get(&lead.id).await.unwrap().stage, LeadStage::Qualified);
    }

    #[tokio::test]
    async fn test_begin_drag_requires_listed_lead() {
        let h = harness().await;
        h.view.refresh().await;

        assert_eq!(
            h.view.begin_drag("ghost").await,
            Err(GestureError::LeadNotListed("ghost".into()))
        );
    }
}
