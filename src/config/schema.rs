use crate::appdelegate::{AnchorStrategy, PatchMode, PatchOptions, TemplateAnchors};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub patch: PatchSection,
    #[serde(default)]
    pub template: TemplateAnchors,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct PatchSection {
    #[serde(default)]
    pub mode: PatchMode,
    #[serde(default)]
    pub anchors: AnchorStrategy,
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let template = &self.template;

        for (field, value) in [
            ("template.class_name", &template.class_name),
            ("template.base_class", &template.base_class),
        ] {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::MissingField { field });
            } else if !is_swift_identifier(value) {
                issues.push(ValidationIssue::NotAnIdentifier {
                    field,
                    value: value.clone(),
                });
            }
        }

        if template.import_anchor.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "template.import_anchor",
            });
        } else if !template.import_anchor.trim_start().starts_with("import ") {
            issues.push(ValidationIssue::InvalidCombo {
                message: format!(
                    "template.import_anchor must be an import line, got '{}'",
                    template.import_anchor
                ),
            });
        }

        if template.linking_anchor.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "template.linking_anchor",
            });
        } else if template.linking_anchor.contains('\n') {
            issues.push(ValidationIssue::InvalidCombo {
                message: "template.linking_anchor must fit on one line".to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn patch_options(&self) -> PatchOptions {
        PatchOptions {
            mode: self.patch.mode,
            anchors: self.patch.anchors,
            template: self.template.clone(),
        }
    }
}

fn is_swift_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField { field: &'static str },
    NotAnIdentifier { field: &'static str, value: String },
    InvalidCombo { message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::NotAnIdentifier { field, value } => {
                write!(f, "'{field}' is not a Swift identifier: '{value}'")
            }
            ValidationIssue::InvalidCombo { message } => {
                write!(f, "invalid configuration: {message}")
            }
        }
    }
}
