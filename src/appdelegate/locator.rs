//! Anchor location for the AppDelegate patch steps.
//!
//! Locators only report spans; they never edit. Every anchor reported for
//! an insertion is a literal slice of the source so the resulting
//! [`Splice`](crate::edit::Splice) can verify it before applying.

use super::snippets::{
    CLASS_END_MARKER_COMMENT, CONTINUE_ACTIVITY_MARKER_COMMENT, IMPORTS_MARKER_COMMENT,
    IMPORT_MODULE,
};
use regex::Regex;
use serde::Deserialize;

/// A span of the source text used as an insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor<'a> {
    pub start: usize,
    pub text: &'a str,
}

impl<'a> Anchor<'a> {
    fn at(source: &'a str, start: usize, end: usize) -> Self {
        Self {
            start,
            text: &source[start..end],
        }
    }

    /// Leading whitespace of the anchor's line.
    pub fn indent(&self) -> &'a str {
        let line = self.text.trim_start_matches(['\n', '\r']);
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }
}

/// The continue-activity override found in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Callback<'a> {
    /// Byte offset of the `{` opening the body
    pub open_brace: usize,
    /// Byte offset of the matching `}`
    pub close_brace: usize,
    /// Body text between the braces
    pub body: &'a str,
    /// Indentation of the declaration line
    pub indent: &'a str,
}

impl Callback<'_> {
    pub fn is_wired(&self, call_marker: &str) -> bool {
        self.body.contains(call_marker)
    }
}

/// How insertion points are found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorStrategy {
    /// Textual patterns matching the stock Expo template
    #[default]
    Pattern,
    /// Versioned `// @spotlight-bridge:v1:*` comments emitted by the generator
    MarkerComments,
}

/// Names that identify the template being patched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplateAnchors {
    pub class_name: String,
    pub base_class: String,
    pub import_anchor: String,
    pub linking_anchor: String,
}

impl Default for TemplateAnchors {
    fn default() -> Self {
        Self {
            class_name: "AppDelegate".to_string(),
            base_class: "ExpoAppDelegate".to_string(),
            import_anchor: "import Expo".to_string(),
            linking_anchor: "let result = RCTLinkingManager.application(".to_string(),
        }
    }
}

/// Compiled anchor patterns for one template.
#[derive(Debug, Clone)]
pub struct Locator {
    strategy: AnchorStrategy,
    class_header: Regex,
    import_anchor: Regex,
    any_import: Regex,
    import_marker: Regex,
    callback_header: Regex,
    linking_anchor: Regex,
    imports_comment: Regex,
    class_end_comment: Regex,
    continue_comment: Regex,
}

/// Escape a literal and let any run of spaces match any horizontal whitespace.
fn loose_literal(text: &str) -> String {
    text.split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[ \t]+")
}

fn comment_line(comment: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\r?\n[ \t]*{}[^\r\n]*", regex::escape(comment)))
}

impl Locator {
    pub fn new(strategy: AnchorStrategy, anchors: &TemplateAnchors) -> Result<Self, regex::Error> {
        let class_header = Regex::new(&format!(
            r"(?m)^[ \t]*(?:@\w+[ \t]+)*(?:(?:public|open|final|internal)[ \t]+)*class[ \t]+{}[ \t]*:[ \t]*{}\b[^{{\n]*\{{",
            regex::escape(&anchors.class_name),
            regex::escape(&anchors.base_class),
        ))?;

        let callback_header = Regex::new(concat!(
            r"(?m)^([ \t]*)(?:@\w+[ \t]+)*(?:(?:public|open)[ \t]+)?override[ \t]+func[ \t]+application\(\s*",
            r"_\s+application:\s*UIApplication\s*,\s*",
            r"continue\s+userActivity:\s*NSUserActivity\s*,\s*",
            r"restorationHandler:\s*@escaping\s*\(\s*\[\s*UIUserActivityRestoring\s*\]\s*\?\s*\)\s*->\s*Void\s*",
            r"\)\s*->\s*Bool\s*\{",
        ))?;

        Ok(Self {
            strategy,
            class_header,
            import_anchor: Regex::new(&format!(
                r"(?mR)^{}[ \t]*$",
                loose_literal(&anchors.import_anchor)
            ))?,
            any_import: Regex::new(r"(?mR)^import[ \t]+[\w.]+[ \t]*$")?,
            import_marker: Regex::new(&format!(r"(?mR)^import[ \t]+{IMPORT_MODULE}[ \t]*$"))?,
            callback_header,
            linking_anchor: Regex::new(&format!(
                r"\r?\n[ \t]*{}",
                loose_literal(&anchors.linking_anchor)
            ))?,
            imports_comment: Regex::new(&format!(
                r"(?m)^[ \t]*{}[^\r\n]*",
                regex::escape(IMPORTS_MARKER_COMMENT)
            ))?,
            class_end_comment: comment_line(CLASS_END_MARKER_COMMENT)?,
            continue_comment: comment_line(CONTINUE_ACTIVITY_MARKER_COMMENT)?,
        })
    }

    pub fn strategy(&self) -> AnchorStrategy {
        self.strategy
    }

    pub fn has_import(&self, source: &str) -> bool {
        self.import_marker.is_match(source)
    }

    /// Span of the class block, header through its closing `}`.
    ///
    /// The closing brace is the one matching the header's `{` and must
    /// start its own line, so a class closed on its header line (`{}`)
    /// has no block to insert members into.
    pub fn class_block(&self, source: &str) -> Option<(usize, usize)> {
        let header = self.class_header.find(source)?;
        let close = matching_brace(source, header.end() - 1)?;
        if !source[..close].trim_end_matches([' ', '\t']).ends_with('\n') {
            return None;
        }
        Some((header.start(), close + 1))
    }

    /// Line after which the import is inserted.
    pub fn import_anchor<'a>(&self, source: &'a str) -> Option<Anchor<'a>> {
        match self.strategy {
            AnchorStrategy::Pattern => self
                .import_anchor
                .find(source)
                .or_else(|| self.any_import.find_iter(source).last())
                .map(|m| Anchor::at(source, m.start(), m.end())),
            AnchorStrategy::MarkerComments => self
                .imports_comment
                .find(source)
                .map(|m| Anchor::at(source, m.start(), m.end())),
        }
    }

    /// Span in front of which class members are appended.
    ///
    /// Always begins with the line break that ends the previous line.
    pub fn class_end<'a>(&self, source: &'a str) -> Option<Anchor<'a>> {
        match self.strategy {
            AnchorStrategy::Pattern => {
                let (_, end) = self.class_block(source)?;
                let newline = source[..end].rfind('\n')?;
                let start = if source[..newline].ends_with('\r') {
                    newline - 1
                } else {
                    newline
                };
                Some(Anchor::at(source, start, end))
            }
            AnchorStrategy::MarkerComments => self
                .class_end_comment
                .find(source)
                .map(|m| Anchor::at(source, m.start(), m.end())),
        }
    }

    /// The continue-activity override, if the template declares one.
    pub fn callback<'a>(&self, source: &'a str) -> Option<Callback<'a>> {
        let caps = self.callback_header.captures(source)?;
        let header = caps.get(0)?;
        let indent = caps.get(1).map_or("", |m| m.as_str());
        let open_brace = header.end() - 1;
        let close_brace = matching_brace(source, open_brace)?;
        Some(Callback {
            open_brace,
            close_brace,
            body: &source[open_brace + 1..close_brace],
            indent,
        })
    }

    /// Statement inside the callback before which the guard is spliced.
    pub fn call_site<'a>(&self, source: &'a str, callback: &Callback<'_>) -> Option<Anchor<'a>> {
        let pattern = match self.strategy {
            AnchorStrategy::Pattern => &self.linking_anchor,
            AnchorStrategy::MarkerComments => &self.continue_comment,
        };
        let body_start = callback.open_brace + 1;
        pattern
            .find(&source[body_start..callback.close_brace])
            .map(|m| Anchor::at(source, body_start + m.start(), body_start + m.end()))
    }
}

/// Find the `}` closing the `{` at `open`.
///
/// Skips braces inside string literals and `//` or `/* */` comments.
/// String interpolation `\( )` never contains braces in the generated
/// template, so it is not tracked.
pub fn matching_brace(source: &str, open: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' && bytes[i] != b'\n' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}
