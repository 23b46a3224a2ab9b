//! Template engine for GitCompass.
//!
//! Templates are YAML or JSON mappings describing issues, project boards and
//! roadmaps. They are looked up across an ordered set of directories
//! (project-local, user-global, built-in), parsed into plain
//! [`serde_json::Value`] trees, merged with caller overrides and finally have
//! their `{placeholder}` tokens substituted. The resolved body is what the
//! issue/project/roadmap code turns into GitHub API calls.
//!
//! # Example
//!
//! ```no_run
//! use gitcompass_templates::{LocationKind, SearchPath, TemplateCategory, TemplateStore, Values};
//!
//! let store = TemplateStore::new(
//!     SearchPath::new()
//!         .with_location(LocationKind::ProjectLocal, ".gitcompass/templates")
//!         .with_location(LocationKind::Builtin, "/usr/share/gitcompass/templates"),
//! );
//!
//! let values = Values::new().with("quarter", "Q3-2025");
//! let roadmap = store.get(&TemplateCategory::Roadmap, "quarterly", &values, &Default::default())?;
//! println!("{}", roadmap["name"]);
//! # Ok::<(), gitcompass_templates::TemplateError>(())
//! ```

mod category;
mod error;
mod format;
mod location;
mod locator;
mod merge;
mod parser;
mod store;
mod substitute;

use std::path::PathBuf;

use serde_json::{Map, Value};

pub use category::TemplateCategory;
pub use error::{Result, TemplateError};
pub use format::{TemplateFormat, LOOKUP_EXTENSIONS};
pub use location::{LocationKind, SearchLocation, SearchPath};
pub use locator::{LocatedTemplate, TemplateLocator};
pub use merge::{merge, merge_value};
pub use parser::{parse, parse_str};
pub use store::{CreateOptions, TemplateStore};
pub use substitute::{placeholders, substitute, substitute_str, substitute_value, unresolved, Values};

/// Parsed template content. Always a mapping at the top level.
pub type TemplateBody = Map<String, Value>;

/// A parsed template as loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub category: TemplateCategory,
    pub name: String,
    /// File the template was loaded from
    pub source_path: PathBuf,
    pub format: TemplateFormat,
    pub location: LocationKind,
    pub body: TemplateBody,
}

impl Template {
    /// The conventional `description` key, if it is a string.
    pub fn description(&self) -> Option<&str> {
        self.body.get("description").and_then(Value::as_str)
    }

    /// Merge `overrides` onto a copy of the body, then substitute `values`.
    pub fn resolve(&self, values: &Values, overrides: &TemplateBody) -> TemplateBody {
        let merged = merge(&self.body, overrides);
        substitute(&merged, values)
    }

    /// Placeholders in the merged body that `values` leaves unresolved.
    ///
    /// Computed before substitution, so braces inside supplied values are
    /// never reported.
    pub fn unresolved(&self, values: &Values, overrides: &TemplateBody) -> Vec<String> {
        unresolved(&merge(&self.body, overrides), values)
    }
}
