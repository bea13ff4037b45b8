//! Candidacy report compilation.
//!
//! A report is one wide CSV per job (or job set) with a fixed block of
//! candidacy columns followed by column groups discovered at run time:
//! pipeline assessments, their scoring dimensions, assessments taken
//! outside the pipeline, their dimensions and organization custom fields.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
