//! Scaleway provider for cloudsweep
//!
//! - [`Client`]: REST client with pagination and error mapping
//! - [`model`]: one struct per resource kind and the [`ScalewayResource`] union
//! - [`ScalewayDiscoverer`]: fetch tasks per product and locality
//! - [`ActionContext`]: delete and named actions (start, retry, cancel jobs; activate Cockpit)
//! - [`CockpitMonitor`]: logs from Cockpit
//! - [`DemoDiscoverer`] / [`DemoMonitor`]: a fabricated account
//!
//! Credentials come from the Scaleway CLI configuration, see [`profile`].

pub mod actions;
pub mod api;
pub mod client;
pub mod cockpit;
pub mod demo;
pub mod discovery;
pub mod error;
pub mod locality;
pub mod model;
pub mod profile;

pub use actions::ActionContext;
pub use client::{Client, PageStyle};
pub use cockpit::CockpitMonitor;
pub use demo::{DemoDiscoverer, DemoMonitor};
pub use discovery::ScalewayDiscoverer;
pub use error::{Result, ScalewayError};
pub use locality::SCALEWAY;
pub use model::ScalewayResource;
pub use profile::Profile;
