//! Swift text inserted into the AppDelegate, and the markers that prove
//! each piece is already there.

/// Import line added next to the Expo import.
pub const IMPORT_LINE: &str = "import CoreSpotlight";

/// Module name checked by the import marker.
pub const IMPORT_MODULE: &str = "CoreSpotlight";

/// Name of the injected handler method.
pub const HANDLER_NAME: &str = "handleCoreSpotlightSearchResult";

/// Present once the handler method has been defined.
pub const HANDLER_MARKER: &str = "func handleCoreSpotlightSearchResult(";

/// Present in the continue-activity body once the hook is wired.
pub const CALL_MARKER: &str = "handleCoreSpotlightSearchResult(userActivity)";

/// Versioned marker comments for generators that emit explicit anchors.
pub const IMPORTS_MARKER_COMMENT: &str = "// @spotlight-bridge:v1:imports";
pub const CLASS_END_MARKER_COMMENT: &str = "// @spotlight-bridge:v1:class-end";
pub const CONTINUE_ACTIVITY_MARKER_COMMENT: &str = "// @spotlight-bridge:v1:continue-activity";

const HANDLER_METHOD: &str = r#"

  // MARK: - Core Spotlight Handling
  func handleCoreSpotlightSearchResult(_ userActivity: NSUserActivity) -> Bool {
    guard userActivity.activityType == CSSearchableItemActionType else {
      return false
    }

    guard let uniqueIdentifier = userActivity.userInfo?[CSSearchableItemActivityIdentifier] as? String else {
      print("No unique identifier found in Core Spotlight search result")
      return false
    }

    // Deep links go through the universal link handling
    if let url = userActivity.userInfo?[CSSearchableItemActivityURL] as? URL {
      print("Core Spotlight search result tapped: \(uniqueIdentifier)")
      print("Opening URL: \(url)")

      DispatchQueue.main.async {
        UIApplication.shared.open(url, options: [:]) { success in
          if success {
            print("Successfully opened URL from Core Spotlight: \(url)")
          } else {
            print("Failed to open URL from Core Spotlight: \(url)")
          }
        }
      }
      return true
    }

    print("Core Spotlight search result tapped: \(uniqueIdentifier)")
    print("No URL found, handling by unique identifier")

    return true
  }"#;

/// Handler method, inserted in front of the class closing line.
pub fn handler_method() -> &'static str {
    HANDLER_METHOD
}

/// Early-return guard, indented to `indent`.
///
/// Starts with a newline and ends with one, so splicing it before a
/// `\n<indent>statement` leaves a blank line between the two.
pub fn guard_clause(indent: &str) -> String {
    format!(
        "\n{indent}// Handle Core Spotlight search result taps\n\
         {indent}if {CALL_MARKER} {{\n\
         {indent}  return true\n\
         {indent}}}\n"
    )
}

/// Line terminator of the file being patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// A file with any `\r\n` is treated as CRLF throughout.
    pub fn detect(source: &str) -> Self {
        if source.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    /// Rewrite `\n`-terminated snippet text to this ending.
    pub fn apply(self, text: &str) -> String {
        match self {
            LineEnding::Lf => text.to_string(),
            LineEnding::CrLf => text.replace('\n', "\r\n"),
        }
    }
}

/// Complete continue-activity override, used when the template has none.
pub fn continue_activity_method() -> String {
    let guard = guard_clause("    ");
    format!(
        "\n\n  // Universal Links\n\
         \x20 public override func application(\n\
         \x20   _ application: UIApplication,\n\
         \x20   continue userActivity: NSUserActivity,\n\
         \x20   restorationHandler: @escaping ([UIUserActivityRestoring]?) -> Void\n\
         \x20 ) -> Bool {{{guard}\n\
         \x20   let result = RCTLinkingManager.application(application, continue: userActivity, restorationHandler: restorationHandler)\n\
         \x20   return super.application(application, continue: userActivity, restorationHandler: restorationHandler) || result\n\
         \x20 }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_ending_follows_source() {
        assert_eq!(LineEnding::detect("import Expo\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("import Expo\r\nimport React\n"), LineEnding::CrLf);
        assert_eq!(
            LineEnding::CrLf.apply(&guard_clause("  ")),
            "\r\n  // Handle Core Spotlight search result taps\r\n  if handleCoreSpotlightSearchResult(userActivity) {\r\n    return true\r\n  }\r\n"
        );
        assert_eq!(LineEnding::Lf.apply("\nimport CoreSpotlight"), "\nimport CoreSpotlight");
    }

    #[test]
    fn test_guard_clause_indentation() {
        assert_eq!(
            guard_clause("    "),
            "\n    // Handle Core Spotlight search result taps\n    if handleCoreSpotlightSearchResult(userActivity) {\n      return true\n    }\n"
        );
    }

    #[test]
    fn test_continue_activity_method_is_wired() {
        let method = continue_activity_method();
        assert!(method.contains(CALL_MARKER));
        assert!(method.contains(
            "\n    let result = RCTLinkingManager.application(application, continue: userActivity, restorationHandler: restorationHandler)\n"
        ));
        assert!(method.starts_with("\n\n  // Universal Links\n  public override func application(\n"));
        assert!(method.ends_with("|| result\n  }"));
    }

    #[test]
    fn test_handler_method_shape() {
        let method = handler_method();
        assert!(method.contains(HANDLER_MARKER));
        assert!(method.contains(r#"print("Opening URL: \(url)")"#));
        assert_eq!(method.matches('{').count(), method.matches('}').count());
        assert!(!method.contains("\n}"));
    }
}
