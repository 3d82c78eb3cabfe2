//! Integration tests for config loading and its effect on patching
//!
//! Tests TOML parsing, validation, and custom template anchors end to end

use spotlight_bridge::appdelegate::{
    AnchorStrategy, AppDelegatePatcher, PatchError, PatchMode, PatchStep, StepOutcome,
};
use spotlight_bridge::config::{
    load_from_path, load_from_str, ConfigError, ValidationIssue, DEFAULT_CONFIG_FILE,
};
use std::fs;
use tempfile::TempDir;

const CUSTOM_TEMPLATE: &str = "import ExpoModulesCore
import UIKit

@main
final class MainDelegate: BaseAppDelegate {
  public override func application(
    _ application: UIApplication,
    continue userActivity: NSUserActivity,
    restorationHandler: @escaping ([UIUserActivityRestoring]?) -> Void
  ) -> Bool {
    let handled = LinkRouter.route(userActivity)
    return handled
  }
}
";

#[test]
fn test_full_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(
        &path,
        r#"
[patch]
mode = "strict"
anchors = "pattern"

[template]
class_name = "MainDelegate"
base_class = "BaseAppDelegate"
import_anchor = "import ExpoModulesCore"
linking_anchor = "let handled = LinkRouter.route("
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.patch.mode, PatchMode::Strict);
    assert_eq!(config.patch.anchors, AnchorStrategy::Pattern);
    assert_eq!(config.template.class_name, "MainDelegate");

    let patcher = AppDelegatePatcher::new(config.patch_options()).unwrap();
    let outcome = patcher.run(CUSTOM_TEMPLATE).unwrap();
    assert!(outcome.steps.iter().all(|s| s.outcome == StepOutcome::Applied));

    let text = &outcome.text;
    assert!(text.starts_with("import ExpoModulesCore\nimport CoreSpotlight\nimport UIKit\n"));
    assert!(text.contains(
        "    if handleCoreSpotlightSearchResult(userActivity) {\n      return true\n    }\n\n    let handled"
    ));
    assert_eq!(patcher.patch(text), *text);
}

#[test]
fn test_default_anchors_do_not_fit_custom_template() {
    let config = load_from_str("[patch]\nmode = \"strict\"\n").unwrap();
    let patcher = AppDelegatePatcher::new(config.patch_options()).unwrap();

    match patcher.run(CUSTOM_TEMPLATE) {
        Err(PatchError::UnrecognizedTemplate { class_name }) => {
            assert_eq!(class_name, "AppDelegate")
        }
        other => panic!("expected unrecognized template, got {other:?}"),
    }
}

#[test]
fn test_partial_template_section_keeps_defaults() {
    let config = load_from_str("[template]\nclass_name = \"MainDelegate\"\n").unwrap();
    assert_eq!(config.template.base_class, "ExpoAppDelegate");
    assert_eq!(config.template.import_anchor, "import Expo");
    assert_eq!(config.patch.mode, PatchMode::Lenient);
}

#[test]
fn test_lenient_config_reports_missing_linking_anchor() {
    let config = load_from_str(
        r#"
[template]
class_name = "MainDelegate"
base_class = "BaseAppDelegate"
import_anchor = "import ExpoModulesCore"
"#,
    )
    .unwrap();
    let patcher = AppDelegatePatcher::new(config.patch_options()).unwrap();
    let outcome = patcher.run(CUSTOM_TEMPLATE).unwrap();

    // Default linking anchor is absent, so the guard goes first in the body
    let call_site = outcome
        .steps
        .iter()
        .find(|s| s.step == PatchStep::CallSite)
        .unwrap();
    assert_eq!(call_site.outcome, StepOutcome::Applied);
    assert!(outcome.text.contains(
        ") -> Bool {\n    // Handle Core Spotlight search result taps\n"
    ));
}

#[test]
fn test_validation_collects_all_issues() {
    let err = load_from_str(
        r#"
[template]
class_name = "Main Delegate"
base_class = ""
import_anchor = "ExpoModulesCore"
"#,
    )
    .unwrap_err();

    match err {
        ConfigError::Validation { source, .. } => {
            assert_eq!(source.issues.len(), 3);
            assert!(source.issues.contains(&ValidationIssue::MissingField {
                field: "template.base_class"
            }));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_unknown_anchor_strategy_is_rejected() {
    let err = load_from_str("[patch]\nanchors = \"guess\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml { .. }));
}
