//! Leadboard Client
//!
//! Client-side coordinator for the lead pipeline (Kanban) of the real-estate
//! admin panel. It consumes the remote lead-management API and owns no data:
//! every mutation goes through [`LeadSync`], which invalidates the shared
//! cache so all views refetch.
//!
//! # Architecture
//!
//! - **Types**: Lead, stage and priority registries live in the `shared-types` crate
//! - **API**: [`api::LeadApi`] with an HTTP backend and an in-memory backend
//! - **State**: filter, selection, drag controller and bulk actions, wired
//!   together by [`PipelineView`]
//!
//! # Example
//!
//! ```rust,ignore
//! use leadboard_client::{InMemoryLeadApi, LeadSync, Notifier, PipelineView};
//! use shared_types::LeadStage;
//!
//! let api = InMemoryLeadApi::with_demo_data().await?;
//! let view = PipelineView::new(Arc::new(LeadSync::new(Arc::new(api))), Notifier::new(), 50);
//! view.refresh().await;
//! view.begin_drag(&lead_id).await?;
//! view.hover(LeadStage::Qualified).await?;
//! view.drop_card().await;
//! ```

pub mod api;
pub mod board;
pub mod bulk;
pub mod cache;
pub mod config;
pub mod drag;
pub mod error;
pub mod filter;
pub mod notify;
pub mod pipeline;
pub mod render;
pub mod selection;
pub mod sync;

// Re-export commonly used types
pub use api::{HttpLeadApi, InMemoryLeadApi, LeadApi};
pub use board::{Board, BoardColumn};
pub use bulk::{BulkCoordinator, BulkReport};
pub use cache::{QueryCache, Tag};
pub use config::ClientConfig;
pub use drag::{DragController, DragState, DropResolution, GestureError, StageChange};
pub use error::{ClientError, LeadApiError};
pub use filter::LeadFilter;
pub use notify::{Notification, NotificationLevel, Notifier};
pub use pipeline::{DropOutcome, LoadingFlags, PipelineView, RefreshOutcome};
pub use selection::SelectionSet;
pub use sync::LeadSync;
