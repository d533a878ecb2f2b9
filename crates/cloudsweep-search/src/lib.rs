//! cloudsweep search index
//!
//! Full-text index over resource metadata, implementing
//! [`Searcher`](cloudsweep_core::Searcher). It lives in memory only and is
//! rebuilt from the store at start-up.
//!
//! # Fields
//!
//! | Field | Content |
//! |-------|---------|
//! | `id` | resource id, exact match |
//! | `name`, `description`, `tags` | free text |
//! | `project_id` | owning project (a project's own id for projects) |
//! | `project` | owning project's name |
//! | `type` | storage key, e.g. `job_run` |
//! | `status` | raw provider status |
//! | `region`, `zone` | locality; zonal resources also carry their region |

pub mod error;
pub mod index;

pub use error::{Result, SearchError};
pub use index::{SearchConfig, SearchIndex};
