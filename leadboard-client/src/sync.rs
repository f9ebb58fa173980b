use shared_types::{CreateLeadRequest, Lead, LeadStage, LeadsResponse, ListLeadsQuery, UpdateLeadRequest};
use std::sync::Arc;

use crate::api::LeadApi;
use crate::cache::{QueryCache, Tag};
use crate::error::LeadApiError;

/// Bound on refetches when list responses keep arriving after an invalidation.
const MAX_STALE_REFETCHES: usize = 3;

/// Remote sync adapter: the lead API behind a tag-invalidated cache.
///
/// Every mutation invalidates the lead's tag and the list tag on success, so
/// the pipeline and table views observe the mutation on their next read.
pub struct LeadSync {
    api: Arc<dyn LeadApi>,
    lists: QueryCache<ListLeadsQuery, LeadsResponse>,
    leads: QueryCache<String, Lead>,
}

fn list_tags(page: &LeadsResponse) -> Vec<Tag> {
    std::iter::once(Tag::lead_list())
        .chain(page.leads.iter().map(|lead| Tag::lead(lead.id.as_str())))
        .collect()
}

impl LeadSync {
    pub fn new(api: Arc<dyn LeadApi>) -> Self {
        Self {
            api,
            lists: QueryCache::new(),
            leads: QueryCache::new(),
        }
    }

    /// Cached page for `query`, fetched when absent or invalidated.
    pub async fn list(&self, query: &ListLeadsQuery) -> Result<LeadsResponse, LeadApiError> {
        if let Some(page) = self.lists.query(query).await {
            tracing::debug!("Lead list cache hit (offset {})", query.offset);
            return Ok(page);
        }
        self.fetch_list(query).await
    }

    /// Fetches `query` from the API regardless of the cache.
    pub async fn fetch_list(&self, query: &ListLeadsQuery) -> Result<LeadsResponse, LeadApiError> {
        let mut refetches = 0;
        loop {
            let ticket = self.lists.begin_fetch().await;
            let page = match self.api.list(query).await {
                Ok(page) => page,
                Err(e) => {
                    self.lists.abandon(ticket).await;
                    return Err(e);
                }
            };
            let tags = list_tags(&page);

            if self.lists.store(query.clone(), ticket, page.clone(), tags).await {
                tracing::debug!(
                    "Fetched {} of {} leads",
                    page.leads.len(),
                    page.pagination.total
                );
                return Ok(page);
            }

            if refetches >= MAX_STALE_REFETCHES {
                tracing::warn!("Lead list kept going stale, returning uncached response");
                return Ok(page);
            }
            refetches += 1;
            tracing::debug!("Discarding lead list fetched before an invalidation, refetching");
        }
    }

    pub async fn get(&self, id: &str) -> Result<Lead, LeadApiError> {
        let key = id.to_string();
        if let Some(lead) = self.leads.query(&key).await {
            return Ok(lead);
        }

        let ticket = self.leads.begin_fetch().await;
        let lead = match self.api.get(id).await {
            Ok(lead) => lead,
            Err(e) => {
                self.leads.abandon(ticket).await;
                return Err(e);
            }
        };
        self.leads
            .store(key, ticket, lead.clone(), [Tag::lead(id)])
            .await;
        Ok(lead)
    }

    pub async fn create(&self, request: &CreateLeadRequest) -> Result<Lead, LeadApiError> {
        let lead = self.api.create(request).await?;
        tracing::info!("Created lead {} ({})", lead.id, lead.name);
        self.invalidate(&[Tag::lead_list()]).await;
        Ok(lead)
    }

    pub async fn update(&self, id: &str, request: &UpdateLeadRequest) -> Result<Lead, LeadApiError> {
        let result = self.api.update(id, request).await;
        self.after_mutation(id, &result).await;
        result
    }

    /// Moves a lead to another stage. Stages outside the registry are
    /// rejected before any request is made.
    pub async fn update_stage(&self, id: &str, stage: LeadStage) -> Result<Lead, LeadApiError> {
        if !stage.is_known() {
            return Err(LeadApiError::Validation(format!(
                "Invalid stage value: {}",
                stage
            )));
        }

        let lead = self.update(id, &UpdateLeadRequest::stage(stage)).await?;
        tracing::info!("Lead {} moved to {}", id, stage);
        Ok(lead)
    }

    pub async fn assign(&self, id: &str, agent_id: &str) -> Result<Lead, LeadApiError> {
        let result = self.api.assign(id, agent_id).await;
        self.after_mutation(id, &result).await;
        if result.is_ok() {
            tracing::info!("Lead {} assigned to {}", id, agent_id);
        }
        result
    }

    pub async fn delete(&self, id: &str) -> Result<(), LeadApiError> {
        let result = self.api.delete(id).await;
        self.after_mutation(id, &result).await;
        if result.is_ok() {
            tracing::info!("Lead {} deleted", id);
        }
        result
    }

    /// Success invalidates the lead and all lists. A not-found or conflict
    /// failure means our copy is stale, so it invalidates as well.
    async fn after_mutation<T>(&self, id: &str, result: &Result<T, LeadApiError>) {
        match result {
            Ok(_) => self.invalidate(&[Tag::lead(id), Tag::lead_list()]).await,
            Err(e) if e.is_stale_lead() => {
                tracing::warn!("Lead {} is stale in cache: {}", id, e);
                self.invalidate(&[Tag::lead(id), Tag::lead_list()]).await
            }
            Err(_) => {}
        }
    }

    async fn invalidate(&self, tags: &[Tag]) {
        let lists = self.lists.invalidate(tags).await;
        let leads = self.leads.invalidate(tags).await;
        tracing::debug!(
            "Invalidated {} cached lists and {} cached leads",
            lists,
            leads
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::Operation;
    use crate::api::InMemoryLeadApi;
    use shared_types::LeadPriority;

    async fn setup() -> (InMemoryLeadApi, LeadSync) {
        let api = InMemoryLeadApi::new();
        let sync = LeadSync::new(Arc::new(api.clone()));
        (api, sync)
    }

    fn new_lead(name: &str) -> CreateLeadRequest {
        CreateLeadRequest {
            name: name.to_string(),
            priority: Some(LeadPriority::Medium),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_is_served_from_cache() {
        let (api, sync) = setup().await;
        sync.create(&new_lead("Amira")).await.unwrap();
        let query = ListLeadsQuery::default();

        sync.list(&query).await.unwrap();
        sync.list(&query).await.unwrap();

        assert_eq!(api.call_count(Operation::List).await, 1);
    }

    #[tokio::test]
    async fn test_stage_update_round_trip() {
        let (_api, sync) = setup().await;
        let lead = sync.create(&new_lead("Amira")).await.unwrap();
        assert_eq!(lead.stage, LeadStage::NewLead);

        // Prime the cache with the old stage
        assert_eq!(sync.get(&lead.id).await.unwrap().stage, LeadStage::NewLead);

        sync.update_stage(&lead.id, LeadStage::Qualified).await.unwrap();

        assert_eq!(sync.get(&lead.id).await.unwrap().stage, LeadStage::Qualified);
    }

    #[tokio::test]
    async fn test_mutation_invalidates_cached_lists() {
        let (api, sync) = setup().await;
        let lead = sync.create(&new_lead("Amira")).await.unwrap();
        let query = ListLeadsQuery::default();
        sync.list(&query).await.unwrap();

        sync.update_stage(&lead.id, LeadStage::Contacted).await.unwrap();
        let page = sync.list(&query).await.unwrap();

        assert_eq!(api.call_count(Operation::List).await, 2);
        assert_eq!(page.leads[0].stage, LeadStage::Contacted);
    }

    #[tokio::test]
    async fn test_unknown_stage_never_reaches_api() {
        let (api, sync) = setup().await;
        let lead = sync.create(&new_lead("Amira")).await.unwrap();

        let result = sync.update_stage(&lead.id, LeadStage::Unknown).await;

        assert!(matches!(result, Err(LeadApiError::Validation(_))));
        assert_eq!(api.call_count(Operation::Update).await, 0);
    }

    #[tokio::test]
    async fn test_update_after_concurrent_delete_fails() {
        let (_api, sync) = setup().await;
        let lead = sync.create(&new_lead("Amira")).await.unwrap();

        sync.delete(&lead.id).await.unwrap();
        let result = sync.update_stage(&lead.id, LeadStage::Negotiation).await;

        assert!(result.unwrap_err().is_stale_lead());
        let page = sync.list(&ListLeadsQuery::default()).await.unwrap();
        assert!(page.leads.iter().all(|l| l.id != lead.id));
    }

    #[tokio::test]
    async fn test_stale_list_response_is_refetched() {
        let (api, sync) = setup().await;
        let sync = Arc::new(sync);
        let lead = sync.create(&new_lead("Amira")).await.unwrap();
        let query = ListLeadsQuery::default();

        let release = api.hold_next_list().await;
        let pending = {
            let sync = sync.clone();
            let query = query.clone();
            tokio::spawn(async move { sync.list(&query).await })
        };
        // Let the held request snapshot the old stage
        while api.call_count(Operation::List).await == 0 {
            tokio::task::yield_now().await;
        }

        sync.update_stage(&lead.id, LeadStage::Qualified).await.unwrap();
        release.send(()).unwrap();

        let page = pending.await.unwrap().unwrap();
        assert_eq!(page.leads[0].stage, LeadStage::Qualified);
        assert_eq!(api.call_count(Operation::List).await, 2);
        assert_eq!(
            sync.list(&query).await.unwrap().leads[0].stage,
            LeadStage::Qualified
        );
    }

    #[tokio::test]
    async fn test_network_failure_keeps_cache() {
        let (api, sync) = setup().await;
        let lead = sync.create(&new_lead("Amira")).await.unwrap();
        let query = ListLeadsQuery::default();
        sync.list(&query).await.unwrap();

        api.fail_next(
            Operation::Update,
            Some(&lead.id),
            LeadApiError::Network("timeout".into()),
        )
        .await;
        let result = sync.update_stage(&lead.id, LeadStage::Contacted).await;

        assert!(matches!(result, Err(LeadApiError::Network(_))));
        sync.list(&query).await.unwrap();
        assert_eq!(api.call_count(Operation::List).await, 1);
    }
}
