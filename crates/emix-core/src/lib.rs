//! # emix-core: Energy Network Model
//!
//! Data structures describing a multi-year, multi-carrier energy network:
//! buses, generators and storages with their technology templates,
//! transmission lines, aggregated consumers served by local balancing
//! stacks, fuels, emission fees and demand-side response programs.
//!
//! ## Quick Start
//!
//! ```rust
//! use emix_core::*;
//!
//! let mut network = Network::new(["ee"], ["co2"], NetworkConstants { n_hours: 24, n_years: 2 });
//! network.add_bus(Bus::new("grid", "ee")).unwrap();
//! network.add_bus(Bus::new("town", "ee")).unwrap();
//! network
//!     .add_line(Line {
//!         name: "grid-town".into(),
//!         energy_type: "ee".into(),
//!         fr: "grid".into(),
//!         to: "town".into(),
//!         transmission_loss: 0.02,
//!         max_capacity: 100.0,
//!         transmission_fee: None,
//!     })
//!     .unwrap();
//!
//! assert!(network.validate().issues.is_empty());
//! ```
//!
//! ## Core Data Structures
//!
//! - [`Network`] - insertion-ordered element collections plus declared carriers
//! - [`elements`] - element definitions referenced by name
//! - [`Diagnostics`] - structured validation findings
//! - [`EmixError`] - unified error type

pub mod diagnostics;
pub mod elements;
pub mod error;
pub mod network;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use elements::*;
pub use error::{EmixError, EmixResult};
pub use network::{Network, NetworkConstants};
