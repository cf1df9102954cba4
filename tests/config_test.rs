use explore_ngin::{
    KeyCode,
    config::{AssetFormat, Category, ControllerConfig, EnvironmentDescriptor, InputCode, LightKind, Manifest},
    error::ConfigError,
    resources::AssetId,
};

use crate::common::test_utils::manifest;

mod common;

#[test]
fn fixture_manifest_parses() {
    let manifest = manifest();

    assert_eq!(manifest.assets.len(), 6);
    assert_eq!(manifest.assets[5].format, AssetFormat::Draco);
    assert_eq!(manifest.assets[0].format, AssetFormat::Gltf);
    assert_eq!(manifest.backgrounds[0].faces.len(), 6);
    assert_eq!(manifest.player.asset, Some(AssetId(4)));
    assert!(manifest.player.camera);

    let courtyard = manifest.environment(1).unwrap();
    assert_eq!(courtyard.entities().count(), 4);
    assert_eq!(courtyard.floor.as_ref().unwrap().category, Category::Floor);
    assert_eq!(courtyard.lights[0].kind, LightKind::Ambient);
    assert_eq!(courtyard.lights[0].colour, [1.0, 1.0, 1.0]);
    assert_eq!(courtyard.lights[1].intensity, 1.0);
    let guide = &courtyard.characters[0];
    assert_eq!(guide.checkpoint.as_ref().unwrap().id, 20);
    assert_eq!(guide.checkpoint.as_ref().unwrap().asset, None);

    // omitted sections fall back to the defaults
    assert_eq!(manifest.controller, ControllerConfig::default());
    assert_eq!(manifest.settings.camera_offset, [0.0, 3.0, 6.0]);
}

#[test]
fn default_bindings_cover_arrows_and_wasd() {
    let controller = ControllerConfig::default();
    assert!(controller.forward.contains(&InputCode::Key(KeyCode::ArrowUp)));
    assert!(controller.forward.contains(&InputCode::Key(KeyCode::KeyW)));
    assert!(controller.right.contains(&InputCode::Key(KeyCode::KeyD)));
    assert_eq!(controller.rotation_step, 0.05);
    assert_eq!(controller.translation_divisor, 80.0);
}

#[test]
fn duplicate_ids_are_fatal() {
    let mut duplicated = manifest();
    duplicated.assets[1].id = AssetId(1);
    assert!(matches!(
        duplicated.validate(),
        Err(ConfigError::DuplicateId { kind: "asset", id: 1 })
    ));

    let mut duplicated = manifest();
    duplicated.environments[1].id = 1;
    assert!(matches!(
        duplicated.validate(),
        Err(ConfigError::DuplicateId { kind: "environment", id: 1 })
    ));

    let mut duplicated = manifest();
    duplicated.environments[0].items[0].id = 3;
    assert!(matches!(
        duplicated.validate(),
        Err(ConfigError::DuplicateId { kind: "entity", id: 3 })
    ));
}

#[test]
fn linked_checkpoints_and_world_entities_share_the_entity_id_space() {
    let mut clashing = manifest();
    // the guide's checkpoint takes the house's id
    clashing.environments[0].characters[0].checkpoint.as_mut().unwrap().id = 3;
    assert!(matches!(
        clashing.validate(),
        Err(ConfigError::DuplicateId { kind: "entity", id: 3 })
    ));

    let mut clashing = manifest();
    clashing.player.id = 5;
    // the plant in the library
    assert!(matches!(
        clashing.validate(),
        Err(ConfigError::DuplicateId { kind: "entity", id: 5 })
    ));

    let mut clashing = manifest();
    clashing.checkpoint.id = 21;
    assert!(matches!(
        clashing.validate(),
        Err(ConfigError::DuplicateId { kind: "entity", id: 21 })
    ));
}

#[test]
fn entity_ids_only_need_to_be_unique_per_environment() {
    let manifest = manifest();
    // both environments use floor 1 and character 2
    assert!(manifest.validate().is_ok());
}

#[test]
fn empty_environment_list_is_rejected() {
    let mut empty = manifest();
    empty.environments.clear();
    assert!(matches!(empty.validate(), Err(ConfigError::NoEnvironments)));
}

#[test]
fn default_environment_is_the_first_flagged_one() {
    let mut manifest = manifest();
    assert_eq!(manifest.default_environment().unwrap().id, 1);

    manifest.environments[1].default = true;
    assert_eq!(manifest.default_environment().unwrap().id, 1);

    manifest.environments.iter_mut().for_each(|env| env.default = false);
    assert!(matches!(
        manifest.default_environment(),
        Err(ConfigError::NoDefaultEnvironment)
    ));
}

#[test]
fn environments_can_be_looked_up_by_name() {
    let mut manifest = manifest();
    assert_eq!(manifest.named_environment("library").unwrap().id, 2);
    assert_eq!(manifest.named_environment("").unwrap().id, 1);
    assert!(matches!(
        manifest.named_environment("attic"),
        Err(ConfigError::UnknownEnvironmentName(name)) if name == "attic"
    ));

    manifest.environments.push(EnvironmentDescriptor::new(3, "library"));
    assert_eq!(manifest.named_environment("library").unwrap().id, 2);
}

#[test]
fn malformed_manifest_reports_a_parse_error() {
    assert!(matches!(Manifest::from_ron("(assets: [)"), Err(ConfigError::Parse(_))));
    assert!(matches!(
        Manifest::load("tests/fixtures/missing.ron"),
        Err(ConfigError::Io(_))
    ));
}
