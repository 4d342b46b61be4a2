//! Configuration loading
//!
//! Runtime settings come from defaults, an optional settings file and the
//! environment (Env > File > Defaults). The static exclusion list lives in its
//! own file and is loaded separately because a missing or broken exclusion file
//! is fatal.

pub mod loader;
pub mod settings;

pub use loader::load_static;
pub use settings::{CiSettings, Settings};
