use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Pipeline stage of a lead.
///
/// The seven known stages are ordered for display only; any stage may move to
/// any other. Values the API sends that are not in the registry deserialize
/// into [`LeadStage::Unknown`] so a single bad record cannot break a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStage {
    NewLead,
    Contacted,
    Qualified,
    ViewingScheduled,
    Negotiation,
    DealClosedWon,
    DealClosedLost,
    #[serde(other)]
    Unknown,
}

/// Lead priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseRegistryError {
    pub kind: &'static str,
    pub value: String,
}

impl LeadStage {
    /// Display order of the Kanban columns.
    pub const ALL: [LeadStage; 7] = [
        LeadStage::NewLead,
        LeadStage::Contacted,
        LeadStage::Qualified,
        LeadStage::ViewingScheduled,
        LeadStage::Negotiation,
        LeadStage::DealClosedWon,
        LeadStage::DealClosedLost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStage::NewLead => "NEW_LEAD",
            LeadStage::Contacted => "CONTACTED",
            LeadStage::Qualified => "QUALIFIED",
            LeadStage::ViewingScheduled => "VIEWING_SCHEDULED",
            LeadStage::Negotiation => "NEGOTIATION",
            LeadStage::DealClosedWon => "DEAL_CLOSED_WON",
            LeadStage::DealClosedLost => "DEAL_CLOSED_LOST",
            LeadStage::Unknown => "UNKNOWN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LeadStage::NewLead => "New Lead",
            LeadStage::Contacted => "Contacted",
            LeadStage::Qualified => "Qualified",
            LeadStage::ViewingScheduled => "Viewing Scheduled",
            LeadStage::Negotiation => "Negotiation",
            LeadStage::DealClosedWon => "Closed Won",
            LeadStage::DealClosedLost => "Closed Lost",
            LeadStage::Unknown => "Unknown",
        }
    }

    /// Color token used by the admin panel for column headers and badges.
    pub fn color(self) -> &'static str {
        match self {
            LeadStage::NewLead => "blue",
            LeadStage::Contacted => "yellow",
            LeadStage::Qualified => "purple",
            LeadStage::ViewingScheduled => "indigo",
            LeadStage::Negotiation => "orange",
            LeadStage::DealClosedWon => "green",
            LeadStage::DealClosedLost => "red",
            LeadStage::Unknown => "gray",
        }
    }

    pub fn is_known(self) -> bool {
        self != LeadStage::Unknown
    }

    /// Column index in [`LeadStage::ALL`], `None` for unknown stages.
    pub fn position(self) -> Option<usize> {
        Self::ALL.iter().position(|stage| *stage == self)
    }
}

impl fmt::Display for LeadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStage {
    type Err = ParseRegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| ParseRegistryError {
                kind: "stage",
                value: s.to_string(),
            })
    }
}

impl LeadPriority {
    pub const ALL: [LeadPriority; 4] = [
        LeadPriority::Low,
        LeadPriority::Medium,
        LeadPriority::High,
        LeadPriority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadPriority::Low => "LOW",
            LeadPriority::Medium => "MEDIUM",
            LeadPriority::High => "HIGH",
            LeadPriority::Urgent => "URGENT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LeadPriority::Low => "Low",
            LeadPriority::Medium => "Medium",
            LeadPriority::High => "High",
            LeadPriority::Urgent => "Urgent",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            LeadPriority::Low => "gray",
            LeadPriority::Medium => "blue",
            LeadPriority::High => "orange",
            LeadPriority::Urgent => "red",
        }
    }
}

impl Default for LeadPriority {
    fn default() -> Self {
        LeadPriority::Medium
    }
}

impl fmt::Display for LeadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadPriority {
    type Err = ParseRegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
            .ok_or_else(|| ParseRegistryError {
                kind: "priority",
                value: s.to_string(),
            })
    }
}
