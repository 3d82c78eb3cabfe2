use super::locator::{AnchorStrategy, Locator, TemplateAnchors};
use super::snippets::{self, LineEnding, CALL_MARKER, HANDLER_MARKER, IMPORT_LINE};
use crate::edit::{EditError, Splice};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// What to do when a step cannot find its anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchMode {
    /// Skip the step and report it in the outcome
    #[default]
    Lenient,
    /// Fail the whole patch
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOptions {
    pub mode: PatchMode,
    pub anchors: AnchorStrategy,
    pub template: TemplateAnchors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchStep {
    Import,
    Handler,
    CallSite,
}

impl PatchStep {
    pub const ALL: [PatchStep; 3] = [PatchStep::Import, PatchStep::Handler, PatchStep::CallSite];
}

impl fmt::Display for PatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchStep::Import => write!(f, "import"),
            PatchStep::Handler => write!(f, "handler-method"),
            PatchStep::CallSite => write!(f, "call-site"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step edited the text
    Applied,
    /// The call-site step had no callback to edit and inserted a full one
    InsertedCallback,
    /// The marker was already present
    AlreadyPresent,
    /// The anchor the step needs is missing
    Skipped { anchor: String },
}

impl StepOutcome {
    pub fn changed_text(&self) -> bool {
        matches!(self, StepOutcome::Applied | StepOutcome::InsertedCallback)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Applied => write!(f, "applied"),
            StepOutcome::InsertedCallback => write!(f, "inserted continue-activity callback"),
            StepOutcome::AlreadyPresent => write!(f, "already present"),
            StepOutcome::Skipped { anchor } => write!(f, "skipped ({anchor} not found)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: PatchStep,
    pub outcome: StepOutcome,
}

/// Patched text plus what each step did.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome carries the patched text"]
pub struct PatchOutcome {
    pub text: String,
    pub steps: Vec<StepReport>,
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        self.steps.iter().any(|s| s.outcome.changed_text())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Skipped { .. }))
    }
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("{step} step: {anchor} not found")]
    AnchorNotFound { step: PatchStep, anchor: String },

    #[error("source is not a recognised {class_name} template")]
    UnrecognizedTemplate { class_name: String },

    #[error("invalid template anchor pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{step} step produced an invalid splice: {source}")]
    Splice {
        step: PatchStep,
        #[source]
        source: EditError,
    },
}

/// Call-site state of the continue-activity callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSiteStatus {
    Wired,
    Unwired,
    Absent,
}

/// Which markers a source already carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStatus {
    pub template: bool,
    pub import: bool,
    pub handler: bool,
    pub call_site: CallSiteStatus,
}

impl MarkerStatus {
    pub fn is_complete(&self) -> bool {
        self.import && self.handler && self.call_site == CallSiteStatus::Wired
    }
}

/// Idempotent AppDelegate patcher.
///
/// Three independent steps, each gated on its own marker and each
/// re-scanning the text produced by the previous one:
///
/// 1. add `import CoreSpotlight` after the Expo import
/// 2. add the `handleCoreSpotlightSearchResult` method to the class
/// 3. call the handler from the continue-activity callback, or add the
///    whole callback when the template has none
///
/// A source without the class header is left untouched.
#[derive(Debug, Clone)]
pub struct AppDelegatePatcher {
    mode: PatchMode,
    class_name: String,
    locator: Locator,
}

type StepResult = Result<(Option<String>, StepOutcome), PatchError>;

impl AppDelegatePatcher {
    pub fn new(options: PatchOptions) -> Result<Self, PatchError> {
        Ok(Self {
            mode: options.mode,
            class_name: options.template.class_name.clone(),
            locator: Locator::new(options.anchors, &options.template)?,
        })
    }

    pub fn mode(&self) -> PatchMode {
        self.mode
    }

    /// Patch `source`, skipping any step whose anchor is missing.
    pub fn patch(&self, source: &str) -> String {
        match self.run_with_mode(source, PatchMode::Lenient) {
            Ok(outcome) => outcome.text,
            Err(_) => source.to_string(),
        }
    }

    /// Patch `source` in the configured mode and report every step.
    pub fn run(&self, source: &str) -> Result<PatchOutcome, PatchError> {
        self.run_with_mode(source, self.mode)
    }

    /// Report which markers `source` already carries, without editing.
    pub fn inspect(&self, source: &str) -> MarkerStatus {
        let call_site = match self.locator.callback(source) {
            Some(callback) if callback.is_wired(CALL_MARKER) => CallSiteStatus::Wired,
            Some(_) => CallSiteStatus::Unwired,
            None => CallSiteStatus::Absent,
        };
        MarkerStatus {
            template: self.locator.class_end(source).is_some(),
            import: self.locator.has_import(source),
            handler: source.contains(HANDLER_MARKER),
            call_site,
        }
    }

    fn run_with_mode(&self, source: &str, mode: PatchMode) -> Result<PatchOutcome, PatchError> {
        if self.locator.class_end(source).is_none() {
            if mode == PatchMode::Strict {
                return Err(PatchError::UnrecognizedTemplate {
                    class_name: self.class_name.clone(),
                });
            }
            tracing::debug!(class = %self.class_name, "class header not found, leaving source untouched");
            let anchor = self.class_anchor_name();
            return Ok(PatchOutcome {
                text: source.to_string(),
                steps: PatchStep::ALL
                    .iter()
                    .map(|&step| StepReport {
                        step,
                        outcome: StepOutcome::Skipped {
                            anchor: anchor.clone(),
                        },
                    })
                    .collect(),
            });
        }

        let eol = LineEnding::detect(source);
        let mut text = source.to_string();
        let mut steps = Vec::with_capacity(PatchStep::ALL.len());

        for step in PatchStep::ALL {
            let (updated, outcome) = match step {
                PatchStep::Import => self.import_step(&text, eol),
                PatchStep::Handler => self.handler_step(&text, eol),
                PatchStep::CallSite => self.call_site_step(&text, eol),
            }?;

            if let StepOutcome::Skipped { anchor } = &outcome {
                if mode == PatchMode::Strict {
                    return Err(PatchError::AnchorNotFound {
                        step,
                        anchor: anchor.clone(),
                    });
                }
                tracing::debug!(%step, %anchor, "anchor not found, step skipped");
            }

            if let Some(updated) = updated {
                text = updated;
            }
            steps.push(StepReport { step, outcome });
        }

        Ok(PatchOutcome { text, steps })
    }

    fn class_anchor_name(&self) -> String {
        match self.locator.strategy() {
            AnchorStrategy::Pattern => format!("class {}", self.class_name),
            AnchorStrategy::MarkerComments => snippets::CLASS_END_MARKER_COMMENT.to_string(),
        }
    }

    fn import_step(&self, text: &str, eol: LineEnding) -> StepResult {
        if self.locator.has_import(text) {
            return Ok((None, StepOutcome::AlreadyPresent));
        }
        let Some(anchor) = self.locator.import_anchor(text) else {
            let anchor = match self.locator.strategy() {
                AnchorStrategy::Pattern => "import line".to_string(),
                AnchorStrategy::MarkerComments => snippets::IMPORTS_MARKER_COMMENT.to_string(),
            };
            return Ok((None, StepOutcome::Skipped { anchor }));
        };

        let line = eol.apply(&format!("\n{IMPORT_LINE}"));
        let splice = Splice::insert_after(anchor.start, anchor.text, &line);
        apply(PatchStep::Import, &splice, text)
    }

    fn handler_step(&self, text: &str, eol: LineEnding) -> StepResult {
        if text.contains(HANDLER_MARKER) {
            return Ok((None, StepOutcome::AlreadyPresent));
        }
        let Some(anchor) = self.locator.class_end(text) else {
            return Ok((
                None,
                StepOutcome::Skipped {
                    anchor: self.class_anchor_name(),
                },
            ));
        };

        let method = eol.apply(snippets::handler_method());
        let splice = Splice::insert_before(anchor.start, anchor.text, &method);
        apply(PatchStep::Handler, &splice, text)
    }

    fn call_site_step(&self, text: &str, eol: LineEnding) -> StepResult {
        let Some(callback) = self.locator.callback(text) else {
            let Some(anchor) = self.locator.class_end(text) else {
                return Ok((
                    None,
                    StepOutcome::Skipped {
                        anchor: self.class_anchor_name(),
                    },
                ));
            };
            let method = eol.apply(&snippets::continue_activity_method());
            let splice = Splice::insert_before(anchor.start, anchor.text, &method);
            let (updated, _) = apply(PatchStep::CallSite, &splice, text)?;
            return Ok((updated, StepOutcome::InsertedCallback));
        };

        if callback.is_wired(CALL_MARKER) {
            return Ok((None, StepOutcome::AlreadyPresent));
        }

        let splice = match self.locator.call_site(text, &callback) {
            Some(site) => Splice::insert_before(
                site.start,
                site.text,
                &eol.apply(&snippets::guard_clause(site.indent())),
            ),
            // No linking statement: the guard becomes the first statement
            None if self.locator.strategy() == AnchorStrategy::Pattern => {
                let indent = format!("{}  ", callback.indent);
                Splice::insert_after(
                    callback.open_brace,
                    "{",
                    &eol.apply(&snippets::guard_clause(&indent)),
                )
            }
            None => {
                return Ok((
                    None,
                    StepOutcome::Skipped {
                        anchor: snippets::CONTINUE_ACTIVITY_MARKER_COMMENT.to_string(),
                    },
                ))
            }
        };
        apply(PatchStep::CallSite, &splice, text)
    }
}

impl Default for AppDelegatePatcher {
    fn default() -> Self {
        Self {
            mode: PatchMode::Lenient,
            class_name: TemplateAnchors::default().class_name,
            locator: Locator::new(AnchorStrategy::Pattern, &TemplateAnchors::default())
                .expect("default anchors are escaped literals"),
        }
    }
}

fn apply(step: PatchStep, splice: &Splice, text: &str) -> StepResult {
    let updated = splice
        .apply(text)
        .map_err(|source| PatchError::Splice { step, source })?;
    Ok((Some(updated), StepOutcome::Applied))
}

/// Patch a stock Expo AppDelegate with the default options.
///
/// Never fails: steps whose anchors are missing are skipped, and a source
/// that is not an AppDelegate template comes back unchanged.
pub fn patch(source: &str) -> String {
    AppDelegatePatcher::default().patch(source)
}
