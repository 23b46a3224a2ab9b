//! Template lookup across the search path.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::category::{validate_name, TemplateCategory};
use crate::error::Result;
use crate::format::{TemplateFormat, LOOKUP_EXTENSIONS};
use crate::location::{LocationKind, SearchLocation, SearchPath};

/// Where a template was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedTemplate {
    pub category: TemplateCategory,
    pub name: String,
    pub path: PathBuf,
    pub format: TemplateFormat,
    pub location: LocationKind,
}

/// Resolves `(category, name)` pairs to files.
#[derive(Debug, Clone)]
pub struct TemplateLocator {
    search_path: SearchPath,
}

impl TemplateLocator {
    pub fn new(search_path: SearchPath) -> Self {
        Self { search_path }
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Find the highest-precedence file for a template.
    ///
    /// `Ok(None)` is the normal "not found" outcome; errors are only raised
    /// for names that cannot be looked up at all.
    pub fn find(&self, category: &TemplateCategory, name: &str) -> Result<Option<LocatedTemplate>> {
        category.validate()?;
        validate_name(name)?;

        for location in self.search_path.locations() {
            if let Some(found) = Self::find_in(location, category, name) {
                debug!(
                    category = %category,
                    name,
                    path = %found.path.display(),
                    location = %found.location,
                    "located template"
                );
                return Ok(Some(found));
            }
        }

        debug!(category = %category, name, "template not found in any location");
        Ok(None)
    }

    /// Check a single location using the fixed extension priority.
    pub fn find_in(location: &SearchLocation, category: &TemplateCategory, name: &str) -> Option<LocatedTemplate> {
        let dir = location.category_dir(category);

        LOOKUP_EXTENSIONS.iter().find_map(|(ext, format)| {
            let candidate = dir.join(format!("{name}.{ext}"));
            candidate.is_file().then(|| LocatedTemplate {
                category: category.clone(),
                name: name.to_string(),
                path: candidate,
                format: *format,
                location: location.kind,
            })
        })
    }

    /// Every visible template of a category, one entry per name, sorted by
    /// name. A name present in several locations is reported once, from the
    /// location that shadows the others.
    pub fn entries(&self, category: &TemplateCategory) -> Vec<LocatedTemplate> {
        let mut seen = BTreeMap::new();

        if let Err(e) = category.validate() {
            warn!(category = %category, error = %e, "refusing to list invalid category");
            return Vec::new();
        }

        for location in self.search_path.locations() {
            for name in template_names(&location.category_dir(category)) {
                if seen.contains_key(&name) {
                    continue;
                }
                if let Some(found) = Self::find_in(location, category, &name) {
                    seen.insert(name, found);
                }
            }
        }

        seen.into_values().collect()
    }

    /// Category directories present in any location.
    pub fn categories(&self) -> Vec<TemplateCategory> {
        let mut categories = BTreeSet::new();

        for location in self.search_path.locations() {
            let entries = match std::fs::read_dir(&location.root) {
                Ok(entries) => entries,
                Err(e) => {
                    if location.root.exists() {
                        warn!(path = %location.root.display(), error = %e, "skipping unreadable template directory");
                    }
                    continue;
                }
            };

            for entry in entries.flatten() {
                if !entry.path().is_dir() {
                    continue;
                }
                if let Some(category) = entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.parse::<TemplateCategory>().ok())
                {
                    categories.insert(category);
                }
            }
        }

        categories.into_iter().collect()
    }
}

/// Template names (file stems) in one category directory.
fn template_names(dir: &Path) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if dir.exists() {
                warn!(path = %dir.display(), error = %e, "skipping unreadable template directory");
            }
            return names;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || TemplateFormat::from_path(&path).is_none() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if validate_name(stem).is_ok() {
                names.insert(stem.to_string());
            }
        }
    }

    names
}
