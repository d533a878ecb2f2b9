//! cloudsweep core
//!
//! Provider-agnostic half of cloudsweep: the resource model, the discovery
//! pipeline and the contract that keeps the local store and the search index
//! in agreement.
//!
//! # Architecture
//!
//! ```text
//!   fetch tasks (kind × locality)
//!          │
//! ┌────────▼────────────────────────────────────────┐
//! │ Coordinator                                      │
//! │  ┌───────────┐   ┌──────────────────────────┐   │
//! │  │ TaskQueue │──▶│ worker × num_workers      │   │
//! │  └─────▲─────┘   │  Ignorable → drop         │   │
//! │        └─────────│  Retryable → requeue      │   │
//! │                  │  Fatal     → abort scan   │   │
//! │                  └────────────┬─────────────┘   │
//! └───────────────────────────────┼─────────────────┘
//!                                 │ mpsc (bounded)
//!                     ┌───────────▼───────────┐      ┌────────────────────┐
//!                     │ drain_into_indexer     │      │ SupervisorRegistry │
//!                     └───────────┬───────────┘      │ (job run polling)  │
//!                                 │                  └─────────┬──────────┘
//!                     ┌───────────▼──────────────────────────▼─┐
//!                     │ Index: store first, then search        │
//!                     └───────┬───────────────────────┬────────┘
//!                             │                       │
//!                       ┌─────▼─────┐           ┌─────▼──────┐
//!                       │  Storer   │           │  Searcher  │
//!                       └───────────┘           └────────────┘
//! ```

pub mod action;
pub mod backend;
pub mod cache;
pub mod classify;
pub mod discovery;
pub mod error;
pub mod indexer;
pub mod locality;
pub mod pipeline;
pub mod resource;
pub mod status;
pub mod supervisor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use action::{Action, find_action};
pub use backend::{LogEntry, Monitorer, Predicate, Searcher, Storer};
pub use cache::TtlCache;
pub use classify::{Classify, ErrorClass, classify_status};
pub use discovery::{Coordinator, Discoverer, DiscoveryConfig, FetchTask, TaskQueue};
pub use error::{Error, Result};
pub use indexer::{Index, Indexer};
pub use locality::{Locality, LocalityCatalog, LocalityPlan};
pub use pipeline::{DrainSummary, drain_into_indexer};
pub use resource::{Metadata, ObservabilityMetadata, Resource, ResourceType, SetOfIds};
pub use status::{Status, StatusCategory, StatusKind};
pub use supervisor::{RunOutcome, SupervisorConfig, SupervisorRegistry};
