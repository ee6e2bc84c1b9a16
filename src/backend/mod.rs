//! Bridge to the native backend and thin typed wrappers over its commands.
//!
//! The bridge itself is opaque: a [`Backend`] takes a command name plus JSON
//! arguments and returns a JSON result or a human-readable failure. The
//! service types below only name the commands and shape the arguments the
//! way the backend expects them (camelCase keys).

mod compose;
mod database;
mod images;
mod volumes;

pub use compose::{ComposeService, ComposeValidation};
pub use database::{ContainerAction, DatabaseService};
pub use images::ImageService;
pub use volumes::VolumeService;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Request/response channel to the native backend.
///
/// Implementations map a failed command to [`Error::Backend`] carrying the
/// backend's message.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run `command` with `args` (a JSON object, or `null` for no arguments).
    async fn invoke(&self, command: &str, args: Value) -> Result<Value>;
}

/// Shared backend handle.
pub type SharedBackend = Arc<dyn Backend>;

/// Invoke `command` and decode the result into `T`.
pub(crate) async fn invoke_as<T: DeserializeOwned>(
    backend: &dyn Backend,
    command: &str,
    args: Value,
) -> Result<T> {
    tracing::debug!("Invoking backend command: {}", command);
    let value = backend.invoke(command, args).await?;
    serde_json::from_value(value).map_err(|e| {
        Error::backend(command, format!("unexpected response shape: {}", e))
    })
}

/// Invoke `command` and discard its result.
pub(crate) async fn invoke_unit(backend: &dyn Backend, command: &str, args: Value) -> Result<()> {
    tracing::debug!("Invoking backend command: {}", command);
    backend.invoke(command, args).await?;
    Ok(())
}
