//! Idempotent CoreSpotlight wiring for generated Expo `AppDelegate.swift` files.
//!
//! The patcher is a pure text-to-text transformation. Reading the file and
//! writing the result back belong to the caller (see [`crate::edit::FileRewrite`]).

pub mod locator;
pub mod patcher;
pub mod snippets;

pub use locator::{AnchorStrategy, TemplateAnchors};
pub use patcher::{
    patch, AppDelegatePatcher, CallSiteStatus, MarkerStatus, PatchError, PatchMode, PatchOptions,
    PatchOutcome, PatchStep, StepOutcome, StepReport,
};
