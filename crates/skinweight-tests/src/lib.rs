//! Skin Weight End-to-End Test Infrastructure
//!
//! This crate provides integration tests for the full weight pipeline:
//!
//! - **Calculation**: scene -> weight data -> weight file
//! - **Application**: weight file -> skin deformer -> scene file
//! - **Properties**: normalization, tolerance, and validation invariants
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p skinweight-tests
//! ```

pub mod fixtures;

// Re-export commonly used items
pub use fixtures::{chain_rig, forked_rig, forked_rig_unbound, two_bone_scene, SceneFixture};
