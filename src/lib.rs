//! Proof-session regeneration: source body-mode rewriting, context/script
//! merging, drift reports, and the phase-ordered prover pipeline.
pub mod check;
pub mod command;
pub mod config;
pub mod drift;
pub mod error;
pub mod merge;
pub mod runner;
pub mod session;
pub mod staging;
pub mod transform;
pub mod workspace;
