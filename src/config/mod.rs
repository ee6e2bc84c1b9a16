//! Runtime configuration.
//!
//! - `types` - the `RuntimeConfig` tree and its defaults
//! - `duration` - human-readable duration strings ("30s", "5m")
//! - `parser` - YAML loading and config file discovery
//! - `validation` - semantic checks on a parsed config

mod duration;
mod parser;
mod types;
mod validation;

pub use duration::*;
pub use parser::*;
pub use types::*;
