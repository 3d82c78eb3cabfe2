//! Property tests for patch idempotence and the no-op guarantee.

use proptest::prelude::*;
use spotlight_bridge::appdelegate::patch;

const CALLBACK_HEAD: &str = "  public override func application(
    _ application: UIApplication,
    continue userActivity: NSUserActivity,
    restorationHandler: @escaping ([UIUserActivityRestoring]?) -> Void
  ) -> Bool {
";
const LINKING: &str = "    let result = RCTLinkingManager.application(application, continue: userActivity, restorationHandler: restorationHandler)
    return super.application(application, continue: userActivity, restorationHandler: restorationHandler) || result
";
const SUPER_ONLY: &str = "    return super.application(application, continue: userActivity, restorationHandler: restorationHandler)
";

#[derive(Debug, Clone)]
struct Template {
    expo_import: bool,
    extra_imports: Vec<String>,
    members: Vec<String>,
    callback: Option<bool>,
    trailing_class: bool,
}

impl Template {
    fn render(&self) -> String {
        let mut out = String::new();
        if self.expo_import {
            out.push_str("import Expo\n");
        }
        for module in &self.extra_imports {
            out.push_str(&format!("import {module}\n"));
        }
        out.push_str("\n@UIApplicationMain\npublic class AppDelegate: ExpoAppDelegate {\n");
        for member in &self.members {
            out.push_str(&format!("  var {member}: Int = 0\n"));
        }
        if let Some(with_linking) = self.callback {
            out.push_str(CALLBACK_HEAD);
            out.push_str(if with_linking { LINKING } else { SUPER_ONLY });
            out.push_str("  }\n");
        }
        out.push_str("}\n");
        if self.trailing_class {
            out.push_str("\nclass ReactNativeDelegate: ExpoReactNativeFactoryDelegate {\n  var extra: Int = 0\n}\n");
        }
        out
    }
}

fn template() -> impl Strategy<Value = Template> {
    (
        any::<bool>(),
        prop::collection::vec("[A-Z][a-zA-Z]{2,8}", 0..3),
        prop::collection::vec("[a-z][a-zA-Z0-9]{0,8}", 0..4),
        prop::option::of(any::<bool>()),
        any::<bool>(),
    )
        .prop_map(
            |(expo_import, extra_imports, members, callback, trailing_class)| Template {
                expo_import,
                extra_imports,
                members,
                callback,
                trailing_class,
            },
        )
}

proptest! {
    /// Patching twice equals patching once.
    #[test]
    fn patch_is_idempotent(t in template()) {
        let source = t.render();
        let once = patch(&source);
        prop_assert_eq!(patch(&once), once);
    }

    /// Each inserted piece appears at most once, and the handler is always added.
    #[test]
    fn markers_appear_once(t in template()) {
        let patched = patch(&t.render());
        prop_assert_eq!(patched.matches("func handleCoreSpotlightSearchResult(").count(), 1);
        prop_assert_eq!(patched.matches("if handleCoreSpotlightSearchResult(userActivity)").count(), 1);
        prop_assert!(patched.matches("import CoreSpotlight\n").count() <= 1);
    }

    /// Patching never removes text, only inserts.
    #[test]
    fn patch_only_inserts(t in template()) {
        let source = t.render();
        let patched = patch(&source);
        let mut rest = patched.as_str();
        for line in source.lines() {
            let at = rest.find(line);
            prop_assert!(at.is_some(), "line lost: {:?}", line);
            rest = &rest[at.unwrap() + line.len()..];
        }
    }

    /// Text without the class header is returned unchanged.
    #[test]
    fn non_template_is_untouched(s in "[a-zA-Z0-9 {}():\n/\"]{0,200}") {
        prop_assume!(!s.contains("AppDelegate"));
        prop_assert_eq!(patch(&s), s);
    }

    /// An already complete file is left byte-for-byte alone.
    #[test]
    fn complete_file_is_a_fixed_point(t in template(), junk in "[a-z ]{0,40}") {
        let patched = patch(&t.render());
        let with_comment = format!("// {junk}\n{patched}");
        prop_assert_eq!(patch(&with_comment), with_comment);
    }
}
