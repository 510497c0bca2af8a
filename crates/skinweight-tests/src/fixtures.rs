//! Test fixture utilities for building rigs and scene files on disk.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use skinweight_solver::memory::SceneFile;

/// Root joint with one child; vertex 0 follows the child, vertex 1 is unbound.
pub fn two_bone_scene() -> SceneFile {
    SceneFile::new()
        .joint("root", None, [0.0, 0.0, 0.0])
        .joint("child", Some("root"), [0.0, 1.0, 0.0])
        .mesh("body", &[[0.0, 1.0, 0.0], [5.0, 5.0, 5.0]])
        .skin("body", "skinCluster1", &["root", "child"])
        .bind_weights("body", 0, &[("child", 1.0)])
}

/// Root joint with two sibling joints.
///
/// Vertex 0 is split evenly between `left` and `right`, vertex 1 follows
/// `left`, and vertex 2 follows `root`.
pub fn forked_rig() -> SceneFile {
    forked_rig_unbound()
        .bind_weights("body", 0, &[("left", 0.5), ("right", 0.5)])
        .bind_weights("body", 1, &[("left", 1.0)])
        .bind_weights("body", 2, &[("root", 1.0)])
}

/// The forked rig's skeleton and mesh with a skin but no weights.
pub fn forked_rig_unbound() -> SceneFile {
    SceneFile::new()
        .joint("root", None, [0.0, 0.0, 0.0])
        .joint("left", Some("root"), [-1.0, 1.0, 0.0])
        .joint("right", Some("root"), [1.0, 1.0, 0.0])
        .mesh(
            "body",
            &[[0.0, 1.0, 0.0], [-1.0, 1.5, 0.0], [0.0, -1.0, 0.0]],
        )
        .skin("body", "skinCluster1", &["root", "left", "right"])
}

/// A single chain `bone0 -> bone1 -> ... -> bone{depth - 1}` with one vertex
/// fully bound to the last bone.
pub fn chain_rig(depth: usize) -> SceneFile {
    let names: Vec<String> = (0..depth).map(|i| format!("bone{}", i)).collect();
    let mut file = SceneFile::new();
    for (i, name) in names.iter().enumerate() {
        let parent = i.checked_sub(1).map(|p| names[p].as_str());
        file = file.joint(name, parent, [0.0, i as f64, 0.0]);
    }
    let influences: Vec<&str> = names.iter().map(String::as_str).collect();
    let last = influences.last().copied().unwrap_or("bone0");
    file.mesh("body", &[[0.0, depth as f64, 0.0]])
        .skin("body", "skinCluster1", &influences)
        .bind_weights("body", 0, &[(last, 1.0)])
}

/// A temporary directory holding scene, weight, and config files.
pub struct SceneFixture {
    pub root: TempDir,
}

impl SceneFixture {
    /// Create a new empty fixture directory.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Get the fixture directory path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Path of a file inside the fixture directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Same as [`SceneFixture::file`], as a string for CLI options.
    pub fn file_str(&self, name: &str) -> String {
        self.file(name).to_string_lossy().into_owned()
    }

    /// Write a scene file and return its path.
    pub fn write_scene(&self, name: &str, scene: &SceneFile) -> PathBuf {
        let path = self.file(name);
        let json = scene.to_json_pretty().expect("Failed to serialize scene");
        fs::write(&path, json).expect("Failed to write scene file");
        path
    }

    /// Write arbitrary text (weights, config) and return its path.
    pub fn write_text(&self, name: &str, content: &str) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }
}

impl Default for SceneFixture {
    fn default() -> Self {
        Self::new()
    }
}
