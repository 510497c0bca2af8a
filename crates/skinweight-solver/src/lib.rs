//! Skin Weight Solver
//!
//! Infers per-vertex skin weights by displacing each bone of a skeleton and
//! measuring how far every vertex follows, then applies persisted weights
//! back to a skin deformer.
//!
//! The solver talks to the scene only through the traits in [`ports`]. A DCC
//! binding implements them for live scenes; [`memory::MemoryScene`] implements
//! them in memory.
//!
//! # Example
//!
//! ```
//! use skinweight_solver::memory::{MemoryScene, SceneFile};
//! use skinweight_solver::{apply_weighting, calculate, SolverConfig};
//!
//! let file = SceneFile::new()
//!     .joint("root", None, [0.0, 0.0, 0.0])
//!     .joint("child", Some("root"), [0.0, 1.0, 0.0])
//!     .mesh("body", &[[0.0, 1.0, 0.0], [5.0, 5.0, 5.0]])
//!     .skin("body", "skinCluster1", &["root", "child"])
//!     .bind_weights("body", 0, &[("child", 1.0)]);
//! let mut scene = MemoryScene::from_scene_file(&file).unwrap();
//!
//! let config = SolverConfig::default();
//! let report = calculate(&mut scene, "body", "root", &config).unwrap();
//! assert_eq!(report.data.order, vec!["child"]);
//! assert_eq!(report.unweighted_vertices, vec![1]);
//!
//! let applied = apply_weighting(&mut scene, "body", None, &report.data, &config).unwrap();
//! assert_eq!(applied.message, "Success");
//! ```
//!
//! # Modules
//!
//! - [`ports`]: Host traits and handles
//! - [`hierarchy`]: Depth-first bone ordering
//! - [`perturb`]: Scoped bone displacement with guaranteed restoration
//! - [`sampler`]: Vertex snapshots and per-bone weights
//! - [`aggregate`]: Tolerance filtering and normalization across bones
//! - [`calculate`]: Calculation entry points
//! - [`apply`]: Application to a skin deformer
//! - [`source`]: Inline versus file data selection
//! - [`config`]: Solver configuration
//! - [`memory`]: In-memory host

pub mod aggregate;
pub mod apply;
pub mod calculate;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod memory;
pub mod perturb;
pub mod ports;
pub mod sampler;
pub mod source;

pub use aggregate::{Aggregated, WeightAggregator};
pub use apply::{apply, apply_weighting, remove_all_weighting, ApplyReport};
pub use calculate::{
    calculate, calculate_to_file, calculate_with_cancel, CalculationReport, CancelFlag,
};
pub use config::{PerturbAxis, SolverConfig, SourcePreference};
pub use error::{AssignmentError, HostError, HostResult, SolverError, SolverResult};
pub use hierarchy::{order_bones, Bone};
pub use memory::MemoryScene;
pub use perturb::{perturb_and_measure, PoseGuard};
pub use ports::{
    DeformerHandle, DeformerPort, GeometryPort, NodeHandle, PosePort, SceneResolver,
};
pub use sampler::{round_to, weights_for_bone, VertexSnapshot};
pub use source::{resolve_data_source, DataSource, ResolvedData, SourceOrigin};
