use futures::future::join_all;
use shared_types::Lead;
use std::sync::Arc;

use crate::error::{ClientError, LeadApiError};
use crate::selection::SelectionSet;
use crate::sync::LeadSync;

#[derive(Debug, Clone, PartialEq)]
pub struct BulkFailure {
    pub lead_id: String,
    pub error: LeadApiError,
}

/// Aggregate outcome of a bulk action. Successful items are not rolled back
/// when others fail.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkReport {
    pub attempted: usize,
    pub failures: Vec<BulkFailure>,
}

impl BulkReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// User-facing aggregate, e.g. "2 of 5 deletions failed".
    pub fn summary(&self) -> String {
        if self.is_success() {
            format!(
                "Deleted {} lead{}",
                self.attempted,
                if self.attempted == 1 { "" } else { "s" }
            )
        } else {
            format!("{} of {} deletions failed", self.failed(), self.attempted)
        }
    }
}

/// Applies actions across the selection set.
pub struct BulkCoordinator {
    sync: Arc<LeadSync>,
}

impl BulkCoordinator {
    pub fn new(sync: Arc<LeadSync>) -> Self {
        Self { sync }
    }

    /// Issues one delete per id concurrently and waits for all of them to
    /// settle. Completion order between the deletes is unspecified.
    pub async fn delete_all(&self, ids: &[String]) -> BulkReport {
        let results = join_all(ids.iter().map(|id| async move {
            let result = self.sync.delete(id).await;
            (id, result)
        }))
        .await;

        let failures: Vec<BulkFailure> = results
            .into_iter()
            .filter_map(|(id, result)| {
                result.err().map(|error| {
                    tracing::warn!("Failed to delete lead {}: {}", id, error);
                    BulkFailure {
                        lead_id: id.clone(),
                        error,
                    }
                })
            })
            .collect();

        let report = BulkReport {
            attempted: ids.len(),
            failures,
        };
        tracing::info!(
            "Bulk delete settled: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }

    /// Assigns the only selected lead. Any other selection size is rejected
    /// without a request.
    pub async fn assign_single(
        &self,
        selection: &SelectionSet,
        agent_id: &str,
    ) -> Result<Lead, ClientError> {
        let lead_id = selection.single().ok_or_else(|| {
            ClientError::PreconditionFailed(format!(
                "assign needs exactly one selected lead, {} selected",
                selection.len()
            ))
        })?;

        Ok(self.sync.assign(lead_id, agent_id).await?)
    }
}
