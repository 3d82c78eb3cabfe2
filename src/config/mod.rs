pub mod loader;
pub mod schema;

pub use loader::{
    load_for_project, load_from_path, load_from_str, ConfigError, ConfigOrigin, DEFAULT_CONFIG_FILE,
};
pub use schema::{BridgeConfig, PatchSection, ValidationError, ValidationIssue};
