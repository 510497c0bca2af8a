//! End-to-end tests for the CLI commands: calculate a weights file, validate
//! it, and apply it to a scene file.
//!
//! The commands run as library calls against files in a temp directory.

use std::process::ExitCode;

use pretty_assertions::assert_eq;

use skinweight_cli::commands;
use skinweight_cli::commands::apply::ApplyOptions;
use skinweight_cli::commands::calculate::CalculateOptions;
use skinweight_cli::commands::settings::ConfigOverrides;
use skinweight_data::{load, WeightEntry};
use skinweight_solver::MemoryScene;
use skinweight_tests::fixtures::{forked_rig, forked_rig_unbound, SceneFixture};

#[test]
fn calculate_validate_apply_pipeline() {
    let fixture = SceneFixture::new();
    fixture.write_scene("rigged.json", &forked_rig());
    fixture.write_scene("target.json", &forked_rig_unbound());

    let code = commands::calculate::run(&CalculateOptions {
        scene: fixture.file_str("rigged.json"),
        mesh: "body".to_string(),
        root: "root".to_string(),
        output: Some(fixture.file_str("weights.json")),
        json: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let code = commands::validate::run(&fixture.file_str("weights.json"), true).unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let code = commands::apply::run(&ApplyOptions {
        scene: fixture.file_str("target.json"),
        mesh: "body".to_string(),
        weights: Some(fixture.file_str("weights.json")),
        output: Some(fixture.file_str("skinned.json")),
        json: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let skinned = MemoryScene::from_file(fixture.file("skinned.json")).unwrap();
    assert_eq!(
        skinned.vertex_weights("body", 0),
        Some(vec![
            WeightEntry::new("left", 0.5),
            WeightEntry::new("right", 0.5)
        ])
    );

    // The input scene is untouched when --output is given.
    let target = MemoryScene::from_file(fixture.file("target.json")).unwrap();
    assert_eq!(target.vertex_weights("body", 0), Some(vec![]));
}

#[test]
fn apply_overwrites_scene_without_output() {
    let fixture = SceneFixture::new();
    fixture.write_scene("scene.json", &forked_rig_unbound());

    let code = commands::apply::run(&ApplyOptions {
        scene: fixture.file_str("scene.json"),
        mesh: "body".to_string(),
        data: Some(r#"{"weight": {"1": [["right", 2.0]]}, "order": ["left", "right"]}"#.into()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let scene = MemoryScene::from_file(fixture.file("scene.json")).unwrap();
    assert_eq!(
        scene.vertex_weights("body", 1),
        Some(vec![WeightEntry::new("right", 1.0)])
    );
}

#[test]
fn inline_data_preferred_when_requested() {
    let fixture = SceneFixture::new();
    fixture.write_scene("scene.json", &forked_rig_unbound());
    fixture.write_text(
        "weights.json",
        r#"{"weight": {"0": [["left", 1.0]]}, "order": ["left", "right"]}"#,
    );

    let code = commands::apply::run(&ApplyOptions {
        scene: fixture.file_str("scene.json"),
        mesh: "body".to_string(),
        weights: Some(fixture.file_str("weights.json")),
        data: Some(r#"{"weight": {"0": [["right", 1.0]]}, "order": ["left", "right"]}"#.into()),
        overrides: ConfigOverrides {
            prefer: Some("inline".to_string()),
            ..Default::default()
        },
        json: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let scene = MemoryScene::from_file(fixture.file("scene.json")).unwrap();
    assert_eq!(
        scene.vertex_weights("body", 0),
        Some(vec![WeightEntry::new("right", 1.0)])
    );
}

#[test]
fn calculate_honors_config_file_and_overrides() {
    let fixture = SceneFixture::new();
    fixture.write_scene("rigged.json", &forked_rig());
    fixture.write_text("solver.json", r#"{"tolerance": 0.9}"#);

    let code = commands::calculate::run(&CalculateOptions {
        scene: fixture.file_str("rigged.json"),
        mesh: "body".to_string(),
        root: "root".to_string(),
        output: Some(fixture.file_str("weights.json")),
        config: Some(fixture.file_str("solver.json")),
        overrides: ConfigOverrides {
            no_normalize: true,
            ..Default::default()
        },
        json: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    // Only vertex 1 follows a bone by more than 0.9.
    let data = load(fixture.file("weights.json")).unwrap();
    assert_eq!(data.vertex_ids(), vec![1]);
    assert_eq!(data.get(1), Some(&vec![WeightEntry::new("left", 1.0)]));
}

#[test]
fn invalid_weights_file_fails_validation_and_apply() {
    let fixture = SceneFixture::new();
    fixture.write_scene("scene.json", &forked_rig_unbound());
    fixture.write_text("bad.json", r#"{"order": [1, 2]}"#);

    let code = commands::validate::run(&fixture.file_str("bad.json"), true).unwrap();
    assert_eq!(code, ExitCode::from(1));

    let code = commands::apply::run(&ApplyOptions {
        scene: fixture.file_str("scene.json"),
        mesh: "body".to_string(),
        weights: Some(fixture.file_str("bad.json")),
        json: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(code, ExitCode::from(1));
}
