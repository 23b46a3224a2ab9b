//! Template store: lookup, caching and administrative writes.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use gitcompass_config::TemplatesConfig;
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::category::{validate_name, TemplateCategory};
use crate::error::{Result, TemplateError};
use crate::format::{TemplateFormat, LOOKUP_EXTENSIONS};
use crate::location::{LocationKind, SearchPath};
use crate::locator::{LocatedTemplate, TemplateLocator};
use crate::parser;
use crate::merge::merge;
use crate::substitute::{substitute, unresolved, Values};
use crate::{Template, TemplateBody};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    category: TemplateCategory,
    name: String,
    path: PathBuf,
}

/// Options for [`TemplateStore::create`] and [`TemplateStore::import`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Format of the written file
    pub format: TemplateFormat,
    /// Replace an existing template of the same name in the target location
    pub overwrite: bool,
    /// Written to the body's `description` key when set
    pub description: Option<String>,
}

impl CreateOptions {
    pub fn new(format: TemplateFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Public façade over locating, parsing, merging and substituting templates.
///
/// Parsed templates are cached per `(category, name, source path)` for the
/// lifetime of the store. The cache is only invalidated by [`create`], so
/// the store assumes template directories do not change underneath a
/// single logical operation.
///
/// [`create`]: TemplateStore::create
#[derive(Debug)]
pub struct TemplateStore {
    locator: TemplateLocator,
    cache: RwLock<HashMap<CacheKey, Arc<Template>>>,
}

impl TemplateStore {
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            locator: TemplateLocator::new(search_path),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Store over the standard project/user/built-in locations.
    pub fn from_config(config: &TemplatesConfig, project_dir: &Path) -> Self {
        Self::new(SearchPath::from_config(config, project_dir))
    }

    pub fn search_path(&self) -> &SearchPath {
        self.locator.search_path()
    }

    /// Where a template would be loaded from.
    pub fn locate(&self, category: &TemplateCategory, name: &str) -> Result<LocatedTemplate> {
        self.locator
            .find(category, name)?
            .ok_or_else(|| TemplateError::NotFound {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    /// Load the raw template, parsing it on first use.
    pub fn load(&self, category: &TemplateCategory, name: &str) -> Result<Arc<Template>> {
        let located = self.locate(category, name)?;
        let key = CacheKey {
            category: category.clone(),
            name: name.to_string(),
            path: located.path.clone(),
        };

        if let Some(cached) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            trace!(category = %category, name, "template cache hit");
            return Ok(Arc::clone(cached));
        }

        let body = parser::parse(&located.path)?;
        let template = Arc::new(Template {
            category: located.category,
            name: located.name,
            source_path: located.path,
            format: located.format,
            location: located.location,
            body,
        });

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&template));

        Ok(template)
    }

    /// Load a template, merge `overrides` onto it, then substitute `values`.
    pub fn get(
        &self,
        category: &TemplateCategory,
        name: &str,
        values: &Values,
        overrides: &TemplateBody,
    ) -> Result<TemplateBody> {
        let template = self.load(category, name)?;
        let merged = merge(&template.body, overrides);

        // Checked before substitution so supplied values containing braces
        // are not reported
        let missing = unresolved(&merged, values);
        if !missing.is_empty() {
            debug!(category = %category, name, ?missing, "template has unresolved placeholders");
        }

        Ok(substitute(&merged, values))
    }

    /// Names visible for a category, sorted and de-duplicated across locations.
    pub fn list(&self, category: &TemplateCategory) -> Vec<String> {
        self.locator
            .entries(category)
            .into_iter()
            .map(|entry| entry.name)
            .collect()
    }

    /// Visible templates for a category with the file each resolves to.
    pub fn list_entries(&self, category: &TemplateCategory) -> Vec<LocatedTemplate> {
        self.locator.entries(category)
    }

    /// Names for every category directory present in any location.
    pub fn list_all(&self) -> BTreeMap<TemplateCategory, Vec<String>> {
        self.locator
            .categories()
            .into_iter()
            .map(|category| {
                let names = self.list(&category);
                (category, names)
            })
            .collect()
    }

    /// Write a new template into a writable location.
    ///
    /// Fails with `AlreadyExists` when the location already holds the name in
    /// any supported format, unless `options.overwrite` is set; on overwrite,
    /// copies in other formats are removed so the new file is the one found.
    pub fn create(
        &self,
        category: &TemplateCategory,
        name: &str,
        mut body: TemplateBody,
        location: LocationKind,
        options: &CreateOptions,
    ) -> Result<PathBuf> {
        if !location.is_writable() {
            return Err(TemplateError::ReadOnlyLocation { location });
        }
        category.validate()?;
        validate_name(name)?;

        let root = self
            .search_path()
            .location(location)
            .ok_or(TemplateError::LocationUnavailable { location })?;
        let dir = root.category_dir(category);
        let target = dir.join(format!("{name}.{}", options.format.extension()));

        let existing: Vec<PathBuf> = LOOKUP_EXTENSIONS
            .iter()
            .map(|(ext, _)| dir.join(format!("{name}.{ext}")))
            .filter(|path| path.is_file())
            .collect();

        if let Some(path) = existing.first() {
            if !options.overwrite {
                return Err(TemplateError::AlreadyExists { path: path.clone() });
            }
        }

        if let Some(description) = &options.description {
            body.insert("description".to_string(), Value::String(description.clone()));
        }

        let content = options.format.serialize(&body)?;
        write_atomic(&target, content.as_bytes())?;

        for stale in existing.iter().filter(|path| **path != target) {
            fs::remove_file(stale).map_err(|e| TemplateError::io(stale, e))?;
        }

        self.invalidate(category, name);
        info!(category = %category, name, path = %target.display(), %location, "created template");
        Ok(target)
    }

    /// Read a YAML or JSON file from anywhere and store it as a template.
    pub fn import(
        &self,
        source: &Path,
        category: &TemplateCategory,
        name: &str,
        location: LocationKind,
        options: &CreateOptions,
    ) -> Result<PathBuf> {
        let body = parser::parse(source)?;
        info!(source = %source.display(), category = %category, name, "importing template");
        self.create(category, name, body, location, options)
    }

    /// Resolve a template and write it to `destination`.
    ///
    /// A `.json` destination is written as JSON, anything else as YAML.
    pub fn export(
        &self,
        category: &TemplateCategory,
        name: &str,
        destination: &Path,
        values: &Values,
        overrides: &TemplateBody,
    ) -> Result<()> {
        let body = self.get(category, name, values, overrides)?;
        let format = match TemplateFormat::from_path(destination) {
            Some(TemplateFormat::Json) => TemplateFormat::Json,
            _ => TemplateFormat::Yaml,
        };

        let content = format.serialize(&body)?;
        write_atomic(destination, content.as_bytes())?;

        info!(category = %category, name, path = %destination.display(), %format, "exported template");
        Ok(())
    }

    /// Drop every cached template.
    pub fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Number of cached templates.
    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn invalidate(&self, category: &TemplateCategory, name: &str) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|key, _| !(key.category == *category && key.name == name));
    }
}

/// Write to a file atomically (write to temp, then rename).
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| TemplateError::io(parent, e))?;

    let mut temp_path = path.to_path_buf();
    match path.file_name() {
        Some(name) => temp_path.set_file_name(format!(".{}.tmp", name.to_string_lossy())),
        None => temp_path.push(".tmp"),
    }

    {
        let mut file = File::create(&temp_path).map_err(|e| TemplateError::io(&temp_path, e))?;
        file.write_all(contents).map_err(|e| TemplateError::io(&temp_path, e))?;
        file.sync_all().map_err(|e| TemplateError::io(&temp_path, e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        TemplateError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        project: TempDir,
        user: TempDir,
        builtin: TempDir,
        store: TemplateStore,
    }

    impl Fixture {
        fn new() -> Self {
            let project = tempdir().unwrap();
            let user = tempdir().unwrap();
            let builtin = tempdir().unwrap();
            let store = TemplateStore::new(
                SearchPath::new()
                    .with_location(LocationKind::ProjectLocal, project.path())
                    .with_location(LocationKind::UserGlobal, user.path())
                    .with_location(LocationKind::Builtin, builtin.path()),
            );
            Self {
                project,
                user,
                builtin,
                store,
            }
        }

        fn root(&self, kind: LocationKind) -> &Path {
            match kind {
                LocationKind::ProjectLocal => self.project.path(),
                LocationKind::UserGlobal => self.user.path(),
                LocationKind::Builtin => self.builtin.path(),
            }
        }

        fn write(&self, kind: LocationKind, category: &str, file: &str, content: &str) {
            let dir = self.root(kind).join(category);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(file), content).unwrap();
        }
    }

    fn body(value: Value) -> TemplateBody {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_precedence_for_every_pair() {
        let kinds = [LocationKind::ProjectLocal, LocationKind::UserGlobal, LocationKind::Builtin];

        for (i, higher) in kinds.iter().enumerate() {
            for lower in &kinds[i + 1..] {
                let fx = Fixture::new();
                fx.write(*higher, "issue", "bug.yaml", &format!("origin: {higher}\n"));
                fx.write(*lower, "issue", "bug.yaml", &format!("origin: {lower}\n"));

                let resolved = fx.store.get(&TemplateCategory::Issue, "bug", &Values::new(), &Map::new()).unwrap();
                assert_eq!(resolved["origin"], json!(higher.as_str()), "{higher} should shadow {lower}");
            }
        }
    }

    #[test]
    fn test_get_merges_then_substitutes() {
        let fx = Fixture::new();
        fx.write(
            LocationKind::Builtin,
            "roadmap",
            "quarterly.yaml",
            r#"
name: Quarterly Release
milestones:
  - name: "{quarter} Planning"
    relative_date: "+2 weeks"
labels:
  - name: "{quarter}"
    color: "5319E7"
"#,
        );

        let overrides = body(json!({"labels": [{"name": "{quarter}-{team}", "color": "000000"}]}));
        let values = Values::new().with("quarter", "Q3-2025");
        let resolved = fx.store.get(&TemplateCategory::Roadmap, "quarterly", &values, &overrides).unwrap();

        assert_eq!(resolved["milestones"][0]["name"], json!("Q3-2025 Planning"));
        assert_eq!(resolved["labels"], json!([{"name": "Q3-2025-{team}", "color": "000000"}]));

        // Cached original is untouched
        let raw = fx.store.load(&TemplateCategory::Roadmap, "quarterly").unwrap();
        assert_eq!(raw.body["milestones"][0]["name"], json!("{quarter} Planning"));
        assert_eq!(raw.body["labels"][0]["color"], json!("5319E7"));
    }

    #[test]
    fn test_not_found() {
        let fx = Fixture::new();
        let err = fx
            .store
            .get(&TemplateCategory::Issue, "nonexistent-xyz", &Values::new(), &Map::new())
            .unwrap_err();
        match err {
            TemplateError::NotFound { category, name } => {
                assert_eq!(category, "issue");
                assert_eq!(name, "nonexistent-xyz");
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed() {
        let fx = Fixture::new();
        fx.write(LocationKind::ProjectLocal, "issue", "scalar.yaml", "\"just text\"\n");

        let err = fx.store.get(&TemplateCategory::Issue, "scalar", &Values::new(), &Map::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Malformed { .. }));
    }

    #[test]
    fn test_cache_is_reused() {
        let fx = Fixture::new();
        fx.write(LocationKind::Builtin, "project", "kanban.yaml", "name: Kanban\n");

        let first = fx.store.load(&TemplateCategory::Project, "kanban").unwrap();
        let second = fx.store.load(&TemplateCategory::Project, "kanban").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fx.store.cached_len(), 1);

        fx.store.clear_cache();
        assert_eq!(fx.store.cached_len(), 0);
    }

    #[test]
    fn test_create_then_get_round_trip() {
        let fx = Fixture::new();
        let written = body(json!({
            "name": "Feature",
            "labels": ["enhancement"],
            "fields": {"body": {"template": "## Summary\n", "required": true}},
            "priority": 2
        }));

        for format in [TemplateFormat::Yaml, TemplateFormat::Json] {
            let name = format!("feature_{format}");
            let path = fx
                .store
                .create(
                    &TemplateCategory::Issue,
                    &name,
                    written.clone(),
                    LocationKind::ProjectLocal,
                    &CreateOptions::new(format),
                )
                .unwrap();
            assert_eq!(path, fx.project.path().join(format!("issue/{name}.{}", format.extension())));

            let read = fx.store.get(&TemplateCategory::Issue, &name, &Values::new(), &Map::new()).unwrap();
            assert_eq!(read, written);
        }
    }

    #[test]
    fn test_create_refuses_existing_without_overwrite() {
        let fx = Fixture::new();
        fx.write(LocationKind::UserGlobal, "issue", "bug.json", "{\"name\": \"old\"}");

        let err = fx
            .store
            .create(
                &TemplateCategory::Issue,
                "bug",
                body(json!({"name": "new"})),
                LocationKind::UserGlobal,
                &CreateOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TemplateError::AlreadyExists { .. }));

        // No partial write
        assert!(!fx.user.path().join("issue/bug.yaml").exists());
        let content = fs::read_to_string(fx.user.path().join("issue/bug.json")).unwrap();
        assert!(content.contains("old"));
    }

    #[test]
    fn test_overwrite_invalidates_cache_and_removes_other_formats() {
        let fx = Fixture::new();
        fx.write(LocationKind::ProjectLocal, "issue", "bug.json", "{\"name\": \"old\"}");

        let before = fx.store.load(&TemplateCategory::Issue, "bug").unwrap();
        assert_eq!(before.body["name"], json!("old"));

        fx.store
            .create(
                &TemplateCategory::Issue,
                "bug",
                body(json!({"name": "new"})),
                LocationKind::ProjectLocal,
                &CreateOptions::new(TemplateFormat::Yaml).overwrite(true),
            )
            .unwrap();

        assert!(!fx.project.path().join("issue/bug.json").exists());
        let after = fx.store.load(&TemplateCategory::Issue, "bug").unwrap();
        assert_eq!(after.body["name"], json!("new"));
        assert_eq!(after.format, TemplateFormat::Yaml);
    }

    #[test]
    fn test_create_shadows_cached_lower_location() {
        let fx = Fixture::new();
        fx.write(LocationKind::Builtin, "issue", "bug.yaml", "name: builtin\n");
        assert_eq!(fx.store.load(&TemplateCategory::Issue, "bug").unwrap().body["name"], json!("builtin"));

        fx.store
            .create(
                &TemplateCategory::Issue,
                "bug",
                body(json!({"name": "local"})),
                LocationKind::ProjectLocal,
                &CreateOptions::default(),
            )
            .unwrap();

        assert_eq!(fx.store.load(&TemplateCategory::Issue, "bug").unwrap().body["name"], json!("local"));
    }

    #[test]
    fn test_create_with_description() {
        let fx = Fixture::new();
        fx.store
            .create(
                &TemplateCategory::Project,
                "board",
                body(json!({"name": "board"})),
                LocationKind::UserGlobal,
                &CreateOptions::default().with_description("Team board"),
            )
            .unwrap();

        let raw = fx.store.load(&TemplateCategory::Project, "board").unwrap();
        assert_eq!(raw.body["description"], json!("Team board"));
        assert_eq!(raw.location, LocationKind::UserGlobal);
    }

    #[test]
    fn test_builtin_is_read_only() {
        let fx = Fixture::new();
        let err = fx
            .store
            .create(
                &TemplateCategory::Issue,
                "bug",
                Map::new(),
                LocationKind::Builtin,
                &CreateOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TemplateError::ReadOnlyLocation { location: LocationKind::Builtin }));
    }

    #[test]
    fn test_custom_category_cannot_escape_location() {
        let parent = tempdir().unwrap();
        let root = parent.path().join("templates");
        fs::create_dir_all(parent.path().join("escaped")).unwrap();
        fs::write(parent.path().join("escaped/secret.yaml"), "a: 1\n").unwrap();

        let store = TemplateStore::new(SearchPath::new().with_location(LocationKind::ProjectLocal, &root));
        let category = TemplateCategory::Custom("../escaped".to_string());

        let err = store
            .create(&category, "x", body(json!({"a": 1})), LocationKind::ProjectLocal, &CreateOptions::default())
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidName { .. }));
        assert!(!parent.path().join("escaped/x.yaml").exists());

        let err = store.get(&category, "secret", &Values::new(), &Map::new()).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidName { .. }));
        assert!(store.list(&category).is_empty());
    }

    #[test]
    fn test_unconfigured_location() {
        let dir = tempdir().unwrap();
        let store = TemplateStore::new(SearchPath::new().with_location(LocationKind::ProjectLocal, dir.path()));
        let err = store
            .create(
                &TemplateCategory::Issue,
                "bug",
                Map::new(),
                LocationKind::UserGlobal,
                &CreateOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TemplateError::LocationUnavailable { .. }));
    }

    #[test]
    fn test_list_deduplicates() {
        let fx = Fixture::new();
        fx.write(LocationKind::ProjectLocal, "issue", "bug_report.yaml", "a: 1\n");
        fx.write(LocationKind::Builtin, "issue", "bug_report.yaml", "a: 2\n");
        fx.write(LocationKind::Builtin, "issue", "feature_request.yaml", "a: 3\n");
        fx.write(LocationKind::UserGlobal, "project", "kanban.json", "{}");

        let names = fx.store.list(&TemplateCategory::Issue);
        assert_eq!(names, vec!["bug_report", "feature_request"]);
        assert_eq!(names.iter().filter(|n| *n == "bug_report").count(), 1);

        let all = fx.store.list_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&TemplateCategory::Project], vec!["kanban"]);
    }

    #[test]
    fn test_import_and_export() {
        let fx = Fixture::new();
        let outside = tempdir().unwrap();

        let source = outside.path().join("source.json");
        fs::write(&source, r#"{"name": "{quarter} board", "columns": ["Todo", "Done"]}"#).unwrap();

        let path = fx
            .store
            .import(
                &source,
                &TemplateCategory::Project,
                "imported",
                LocationKind::ProjectLocal,
                &CreateOptions::default(),
            )
            .unwrap();
        assert!(path.ends_with("project/imported.yaml"));

        let dest = outside.path().join("out/board.json");
        fx.store
            .export(
                &TemplateCategory::Project,
                "imported",
                &dest,
                &Values::new().with("quarter", "Q1"),
                &Map::new(),
            )
            .unwrap();

        let exported: Value = serde_json::from_str(&fs::read_to_string(&dest).unwrap()).unwrap();
        assert_eq!(exported, json!({"name": "Q1 board", "columns": ["Todo", "Done"]}));

        let yaml_dest = outside.path().join("board.yml");
        fx.store
            .export(&TemplateCategory::Project, "imported", &yaml_dest, &Values::new(), &Map::new())
            .unwrap();
        let reparsed = parser::parse(&yaml_dest).unwrap();
        assert_eq!(reparsed["name"], json!("{quarter} board"));
    }

    #[test]
    fn test_import_rejects_non_mapping() {
        let fx = Fixture::new();
        let outside = tempdir().unwrap();
        let source = outside.path().join("list.yaml");
        fs::write(&source, "- a\n- b\n").unwrap();

        let err = fx
            .store
            .import(
                &source,
                &TemplateCategory::Issue,
                "list",
                LocationKind::ProjectLocal,
                &CreateOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TemplateError::Malformed { .. }));
        assert!(!fx.project.path().join("issue/list.yaml").exists());
    }

    #[test]
    fn test_store_is_shareable_across_threads() {
        let fx = Fixture::new();
        fx.write(LocationKind::Builtin, "issue", "bug.yaml", "title: \"{who}\"\n");
        let store = Arc::new(fx.store);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let values = Values::new().with("who", format!("worker-{i}"));
                    store.get(&TemplateCategory::Issue, "bug", &values, &Map::new()).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let resolved = handle.join().unwrap();
            assert_eq!(resolved["title"], json!(format!("worker-{i}")));
        }
        assert_eq!(store.cached_len(), 1);
    }
}
