//! Spotlight Bridge: CoreSpotlight indexing for Expo apps
//!
//! Two halves:
//!
//! - [`appdelegate`] patches a generated `AppDelegate.swift` so that tapping a
//!   Spotlight result routes into the app. The patcher is a pure, idempotent
//!   text transformation: patching an already patched file is a no-op.
//! - [`index`] exposes the JavaScript-facing indexing operations over an
//!   [`IndexClient`], validating [`item`] payloads before anything reaches
//!   the platform index.
//!
//! # Safety
//!
//! - Every splice verifies its expected before-text
//! - Atomic file writes (tempfile + fsync + rename)
//! - Refuses to write if the file changed after it was read
//! - Project boundary enforcement
//!
//! # Example
//!
//! ```
//! use spotlight_bridge::appdelegate::patch;
//!
//! let source = "import Expo\n\n@UIApplicationMain\npublic class AppDelegate: ExpoAppDelegate {\n}\n";
//! let patched = patch(source);
//!
//! assert!(patched.contains("import CoreSpotlight"));
//! assert_eq!(patch(&patched), patched);
//! ```

pub mod appdelegate;
pub mod config;
pub mod edit;
pub mod index;
pub mod item;
pub mod project;

// Re-exports
pub use appdelegate::{
    patch, AnchorStrategy, AppDelegatePatcher, MarkerStatus, PatchError, PatchMode,
    PatchOptions, PatchOutcome, PatchStep, StepOutcome, TemplateAnchors,
};
pub use config::{load_from_path, load_from_str, BridgeConfig, ConfigError};
pub use edit::{EditError, EditResult, EditVerification, FileRewrite, Splice};
pub use index::{IndexClient, IndexError, MemoryIndex, SpotlightModule, UnsupportedPlatform};
pub use item::{AttributeSet, IndexEntry, ItemError, ItemWarning, SearchableItem};
pub use project::{discover_app_delegate, ProjectError, ProjectGuard};
