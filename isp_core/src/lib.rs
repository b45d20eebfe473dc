//! Core implementation of an Interpreter Scheduling Problem (ISP) solver.
//!
//! The crate turns an instance (interpreters, languages, sessions, time
//! blocks and their relations) into a sparse mixed-integer linear program,
//! hands it to a pluggable MILP engine, and projects the result back into a
//! readable schedule. See [`model::builder::ModelBuilder`] for the encoding
//! and [`solve::solve`] for the drive/extract protocol.

pub mod configuration;
pub mod instance;
pub mod io;
pub mod model;
pub mod optimize;
pub mod solve;
