//! Search locations and their precedence.

use std::fmt;
use std::path::{Path, PathBuf};

use gitcompass_config::TemplatesConfig;

use crate::category::TemplateCategory;

/// Kind of a template root. Declaration order is precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationKind {
    /// `<project>/.gitcompass/templates`
    ProjectLocal,
    /// `~/.gitcompass/templates`
    UserGlobal,
    /// Templates shipped with GitCompass
    Builtin,
}

impl LocationKind {
    /// Whether `create` may write here.
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::Builtin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectLocal => "project-local",
            Self::UserGlobal => "user-global",
            Self::Builtin => "built-in",
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A template root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLocation {
    pub kind: LocationKind,
    pub root: PathBuf,
}

impl SearchLocation {
    pub fn new(kind: LocationKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: root.into(),
        }
    }

    /// Directory holding templates of one category.
    pub fn category_dir(&self, category: &TemplateCategory) -> PathBuf {
        self.root.join(category.as_str())
    }
}

/// Ordered list of template roots, highest precedence first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    locations: Vec<SearchLocation>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location, keeping kinds in precedence order. Locations of the
    /// same kind keep their insertion order.
    pub fn with_location(mut self, kind: LocationKind, root: impl Into<PathBuf>) -> Self {
        self.push(SearchLocation::new(kind, root));
        self
    }

    pub fn push(&mut self, location: SearchLocation) {
        let index = self
            .locations
            .iter()
            .position(|existing| existing.kind > location.kind)
            .unwrap_or(self.locations.len());
        self.locations.insert(index, location);
    }

    /// Build the standard search path for a project directory.
    ///
    /// Locations that cannot be resolved (no home directory, no packaged
    /// templates) are left out.
    pub fn from_config(config: &TemplatesConfig, project_dir: &Path) -> Self {
        let mut path = Self::new().with_location(LocationKind::ProjectLocal, config.project_root(project_dir));

        if let Some(user) = config.user_root() {
            path = path.with_location(LocationKind::UserGlobal, user);
        }
        if let Some(builtin) = config.builtin_root() {
            path = path.with_location(LocationKind::Builtin, builtin);
        }

        path
    }

    pub fn locations(&self) -> &[SearchLocation] {
        &self.locations
    }

    /// First location of the given kind.
    pub fn location(&self, kind: LocationKind) -> Option<&SearchLocation> {
        self.locations.iter().find(|location| location.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
