//! Comparative benchmarking of memory-reclamation strategies.
//!
//! The binary runs in one of two roles. As the orchestrator it walks the
//! configuration registry, probes each configuration for availability,
//! and re-launches itself as a worker per configuration with output
//! redirected to a raw log. As the worker it runs a library of synthetic
//! allocation workloads under the selected [`policy::ReclaimPolicy`],
//! printing summary and memory-delta lines in a fixed grammar. The
//! orchestrator parses those logs back into structured results and emits
//! markdown, detailed-text, CSV and JSON comparison reports.

pub mod collect;
pub mod config;
pub mod harness;
pub mod memory;
pub mod orchestrator;
pub mod policy;
pub mod report;
pub mod schema;
pub mod worker;
pub mod workloads;
