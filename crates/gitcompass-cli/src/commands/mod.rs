//! Command implementations.

mod templates;

pub use templates::{ResolveInputs, TemplatesAction, TemplatesCommand};
