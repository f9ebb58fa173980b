use shared_types::LeadStage;

/// Gesture state of the Kanban board.
///
/// Independent of the input mechanism: pointer, touch and synthetic test
/// events all drive the same transitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        lead_id: String,
        origin: LeadStage,
    },
    Hovering {
        lead_id: String,
        origin: LeadStage,
        target: LeadStage,
    },
}

/// Stage change requested by a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageChange {
    pub lead_id: String,
    pub from: LeadStage,
    pub to: LeadStage,
}

/// What a drop resolved to. At most one stage change per drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropResolution {
    /// Dropped on the column the card came from.
    NoOp,
    /// Released outside any column, or nothing was being dragged.
    Cancelled,
    Change(StageChange),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GestureError {
    #[error("Lead {0} is already being dragged")]
    AlreadyDragging(String),

    #[error("Stage update for lead {0} is still in flight")]
    UpdateInFlight(String),

    #[error("No drag gesture is active")]
    NotDragging,

    #[error("{0} is not a valid drop target")]
    InvalidTarget(LeadStage),

    #[error("Lead {0} is not on the board")]
    LeadNotListed(String),
}

/// Drag-and-drop transition controller for a single pointer.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
    in_flight: Option<StageChange>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Stage change whose request has not completed yet. The card keeps
    /// rendering under `from` until the refetch after completion.
    pub fn in_flight(&self) -> Option<&StageChange> {
        self.in_flight.as_ref()
    }

    pub fn start(&mut self, lead_id: &str, origin: LeadStage) -> Result<(), GestureError> {
        match &self.state {
            DragState::Dragging { lead_id, .. } | DragState::Hovering { lead_id, .. } => {
                return Err(GestureError::AlreadyDragging(lead_id.clone()));
            }
            DragState::Idle => {}
        }
        if let Some(change) = &self.in_flight {
            return Err(GestureError::UpdateInFlight(change.lead_id.clone()));
        }

        self.state = DragState::Dragging {
            lead_id: lead_id.to_string(),
            origin,
        };
        Ok(())
    }

    pub fn hover(&mut self, target: LeadStage) -> Result<(), GestureError> {
        if !target.is_known() {
            return Err(GestureError::InvalidTarget(target));
        }

        let (lead_id, origin) = match &self.state {
            DragState::Idle => return Err(GestureError::NotDragging),
            DragState::Dragging { lead_id, origin } | DragState::Hovering { lead_id, origin, .. } => {
                (lead_id.clone(), *origin)
            }
        };
        self.state = DragState::Hovering {
            lead_id,
            origin,
            target,
        };
        Ok(())
    }

    /// Pointer left every column without releasing.
    pub fn leave(&mut self) {
        if let DragState::Hovering { lead_id, origin, .. } = &self.state {
            self.state = DragState::Dragging {
                lead_id: lead_id.clone(),
                origin: *origin,
            };
        }
    }

    /// Releases the card. The controller is `Idle` afterwards whatever the
    /// resolution; a `Change` is recorded as in flight until [`complete`].
    ///
    /// [`complete`]: DragController::complete
    pub fn drop(&mut self) -> DropResolution {
        match std::mem::take(&mut self.state) {
            DragState::Idle | DragState::Dragging { .. } => DropResolution::Cancelled,
            DragState::Hovering {
                origin, target, ..
            } if origin == target => DropResolution::NoOp,
            DragState::Hovering {
                lead_id,
                origin,
                target,
            } => {
                let change = StageChange {
                    lead_id,
                    from: origin,
                    to: target,
                };
                self.in_flight = Some(change.clone());
                DropResolution::Change(change)
            }
        }
    }

    pub fn cancel(&mut self) -> DropResolution {
        self.state = DragState::Idle;
        DropResolution::Cancelled
    }

    /// Marks the in-flight stage change as settled, successfully or not.
    pub fn complete(&mut self) -> Option<StageChange> {
        self.in_flight.take()
    }

    pub fn is_active(&self) -> bool {
        self.state != DragState::Idle
    }
}
