//! Skin weight CLI library.
//!
//! Command implementations behind the `skinweight` binary. Scenes are loaded
//! into a [`skinweight_solver::MemoryScene`] from JSON scene files.

pub mod commands;
