//! Shared utilities across levipack modules.

pub mod paths;

pub use paths::ContainerPath;
