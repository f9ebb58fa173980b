use shared_types::{Lead, LeadStage};

/// One Kanban column
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub stage: LeadStage,
    pub label: &'static str,
    pub color: &'static str,
    pub leads: Vec<Lead>,
}

impl BoardColumn {
    fn new(stage: LeadStage) -> Self {
        Self {
            stage,
            label: stage.label(),
            color: stage.color(),
            leads: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.leads.len()
    }

    /// Sum of the deal values in the column; leads without one count as zero.
    pub fn total_deal_value(&self) -> f64 {
        self.leads.iter().filter_map(|lead| lead.deal_value).sum()
    }
}

/// Leads grouped by stage in registry order.
///
/// Leads with a stage outside the registry are logged and collected into a
/// trailing "Unknown" column that only exists when it has cards.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub columns: Vec<BoardColumn>,
}

impl Board {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let mut columns: Vec<BoardColumn> =
            LeadStage::ALL.into_iter().map(BoardColumn::new).collect();
        let mut unknown = BoardColumn::new(LeadStage::Unknown);

        for lead in leads {
            match lead.stage.position() {
                Some(index) => columns[index].leads.push(lead.clone()),
                None => {
                    tracing::warn!("Lead {} has a stage outside the pipeline registry", lead.id);
                    unknown.leads.push(lead.clone());
                }
            }
        }

        if !unknown.leads.is_empty() {
            columns.push(unknown);
        }

        Self { columns }
    }

    pub fn column(&self, stage: LeadStage) -> Option<&BoardColumn> {
        self.columns.iter().find(|column| column.stage == stage)
    }

    /// Stage column currently holding `lead_id`.
    pub fn locate(&self, lead_id: &str) -> Option<LeadStage> {
        self.columns
            .iter()
            .find(|column| column.leads.iter().any(|lead| lead.id == lead_id))
            .map(|column| column.stage)
    }

    pub fn total_leads(&self) -> usize {
        self.columns.iter().map(BoardColumn::count).sum()
    }
}
