//! User preference stores kept in durable key/value storage.
//!
//! Both stores load once at construction and write through on every change.
//! Storage failures are logged and otherwise ignored so that a broken
//! storage file never takes down the runtime.

mod favorites;
mod templates;

pub use favorites::{FavoritesStore, FAVORITES_KEY};
pub use templates::{DbTemplate, TemplateConfig, TemplateStore, CUSTOM_TEMPLATES_KEY};
