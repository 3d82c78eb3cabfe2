//! Bridge between JavaScript-facing operations and a platform search index.

pub mod client;
pub mod memory;
pub mod module;
pub mod unsupported;

pub use client::{IndexClient, IndexError};
pub use memory::MemoryIndex;
pub use module::SpotlightModule;
pub use unsupported::UnsupportedPlatform;
