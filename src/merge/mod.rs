//! Dependency resolution and conflict-aware merging.
//!
//! The pipeline on the import side is compare → decide → apply, each in its
//! own module:
//!
//! - **collect**: the dependency closure an export needs ([`Closure`]).
//! - **equivalence**: per-category structural identity with printable
//!   signatures.
//! - **resolve**: the pure policy table ([`decide`]) and the result
//!   aggregator.
//! - **import**: the dispatcher that walks an export document in a fixed
//!   order and applies each decision to the destination project.
//!
//! # Failure semantics
//!
//! A `fail` conflict stops processing immediately but does not roll back:
//! components merged earlier in the same call stay merged.

pub mod collect;
pub mod equivalence;
pub mod import;
pub mod resolve;


pub use collect::{Closure, Collector, TypeDeps, collect_logic_deps, collect_type_deps};
pub use equivalence::{Comparison, compare};
pub use import::{ImportOptions, analyze_import, import_component};
pub use resolve::{Decision, Existing, Outcome, decide};
