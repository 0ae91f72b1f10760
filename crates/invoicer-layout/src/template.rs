//! # Templates
//!
//! Template sources and a manager that compiles their text into a
//! [`Handlebars`] registry.
//!
//! ## Lookup
//! ```text
//! TemplateManager::render("invoice.html", data)
//!        │
//!        ├── compiled already? ───────────────────────┐
//!        │                                            │
//!        ▼                                            ▼
//!   source[0].load ─✗─► source[1].load ─✗─► ...  registry.render(data)
//!        │ ✓                                          │
//!        └──► register_template_string ───────────────┘
//!
//!   every source fails ──► LayoutError::TemplateNotFound
//!   bad syntax         ──► LayoutError::TemplateSyntax
//!   helper failure     ──► LayoutError::TemplateRender
//! ```
//!
//! Each name is loaded and compiled once; rendering runs against the
//! serialized data every time. See [`crate::helpers`] for the helper set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use handlebars::{Handlebars, HelperDef};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{LayoutError, LayoutResult};
use crate::helpers;

/// Data handed to a template: the invoice, its items and formatted totals.
pub type TemplateContext = serde_json::Map<String, serde_json::Value>;

const TEMPLATE_EXTENSIONS: &[&str] = &["html", "tmpl"];

/// Somewhere template text can be loaded from.
pub trait TemplateSource: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    fn load(&self, name: &str) -> LayoutResult<String>;

    /// Names this source can load, sorted.
    fn list(&self) -> LayoutResult<Vec<String>>;
}

// =============================================================================
// Filesystem Source
// =============================================================================

/// Loads templates relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collect(&self, dir: &Path, out: &mut Vec<String>) -> LayoutResult<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.collect(&path, out)?;
                continue;
            }
            let is_template = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext));
            if !is_template {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.root) {
                let name: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(name.join("/"));
            }
        }
        Ok(())
    }
}

impl TemplateSource for FsSource {
    fn describe(&self) -> String {
        format!("fs:{}", self.root.display())
    }

    fn load(&self, name: &str) -> LayoutResult<String> {
        let relative = Path::new(name);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(LayoutError::template_not_found(
                name,
                "path escapes the template root",
            ));
        }

        std::fs::read_to_string(self.root.join(relative))
            .map_err(|e| LayoutError::template_not_found(name, e.to_string()))
    }

    fn list(&self) -> LayoutResult<Vec<String>> {
        let mut names = Vec::new();
        self.collect(&self.root, &mut names)?;
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// In-Memory Source
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    templates: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.templates.insert(name.into(), text.into());
    }
}

impl TemplateSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{} templates", self.templates.len())
    }

    fn load(&self, name: &str) -> LayoutResult<String> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| LayoutError::template_not_found(name, "not in memory source"))
    }

    fn list(&self) -> LayoutResult<Vec<String>> {
        Ok(self.templates.keys().cloned().collect())
    }
}

// =============================================================================
// Manager
// =============================================================================

/// Tries sources in order and keeps what it compiles.
pub struct TemplateManager {
    sources: Vec<Box<dyn TemplateSource>>,
    registry: RwLock<Handlebars<'static>>,
}

impl Default for TemplateManager {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            registry: RwLock::new(helpers::registry()),
        }
    }
}

impl TemplateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl TemplateSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Adds or replaces a helper, e.g. a house date format.
    pub fn with_helper(
        mut self,
        name: &str,
        helper: impl HelperDef + Send + Sync + 'static,
    ) -> Self {
        self.registry
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .register_helper(name, Box::new(helper));
        self
    }

    /// Raw template text from the first source that has `name`.
    pub fn load(&self, name: &str) -> LayoutResult<String> {
        let mut reasons = Vec::new();
        for source in &self.sources {
            match source.load(name) {
                Ok(text) => {
                    info!(template = %name, source = %source.describe(), "Loaded template");
                    return Ok(text);
                }
                Err(e) => {
                    debug!(
                        template = %name,
                        source = %source.describe(),
                        error = %e,
                        "Source miss"
                    );
                    reasons.push(source.describe());
                }
            }
        }

        let reason = if reasons.is_empty() {
            "no template sources configured".to_string()
        } else {
            format!("not found in {}", reasons.join(", "))
        };
        Err(LayoutError::template_not_found(name, reason))
    }

    pub fn is_compiled(&self, name: &str) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .has_template(name)
    }

    /// Loads and compiles `name` unless it is already registered.
    pub fn compile(&self, name: &str) -> LayoutResult<()> {
        if self.is_compiled(name) {
            return Ok(());
        }

        let text = self.load(name)?;
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_template_string(name, text)
            .map_err(|e| LayoutError::TemplateSyntax {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Renders `name` against `data`, compiling it on first use.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> LayoutResult<String> {
        self.compile(name)?;
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .render(name, data)
            .map_err(|e| LayoutError::TemplateRender {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Every name any source can load, sorted and deduplicated. Sources that
    /// fail to list are skipped.
    pub fn list_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sources
            .iter()
            .filter_map(|source| match source.list() {
                Ok(names) => Some(names),
                Err(e) => {
                    debug!(source = %source.describe(), error = %e, "Failed to list templates");
                    None
                }
            })
            .flatten()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Drops compiled templates; helpers stay registered.
    pub fn clear_cache(&self) {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear_templates();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> serde_json::Value {
        json!({
            "number": "INV-001",
            "currency": "USD",
            "customer_name": "Smith & Sons",
            "items": [
                { "description": "Design", "quantity": "2", "net": "200" },
                { "description": "Hosting", "quantity": "1", "net": "15.5" },
            ],
        })
    }

    fn manager(name: &str, text: &str) -> TemplateManager {
        TemplateManager::new().with_source(MemorySource::new().with(name, text))
    }

    #[test]
    fn test_placeholders_and_missing_values() {
        let manager = manager("t.html", "<h1>{{ number }}</h1><p>{{missing}}</p>");
        assert_eq!(
            manager.render("t.html", &data()).unwrap(),
            "<h1>INV-001</h1><p></p>"
        );
    }

    #[test]
    fn test_each_over_items_with_helpers() {
        let manager = manager(
            "items.html",
            "{{#each items}}<p>{{add @index 1}}. {{upper description}} \
             {{formatMoney net ../currency}}</p>{{/each}}",
        );
        assert_eq!(
            manager.render("items.html", &data()).unwrap(),
            "<p>1. DESIGN $ 200.00</p><p>2. HOSTING $ 15.50</p>"
        );
    }

    #[test]
    fn test_values_are_html_escaped() {
        let manager = manager("t.html", "<p>{{customer_name}}</p>");
        assert_eq!(
            manager.render("t.html", &data()).unwrap(),
            "<p>Smith &amp; Sons</p>"
        );
    }

    #[test]
    fn test_unknown_helper_fails_render() {
        let manager = manager("t.html", "<p>{{shout customer_name}}</p>");
        let err = manager.render("t.html", &data()).unwrap_err();
        assert!(matches!(err, LayoutError::TemplateRender { ref name, .. } if name == "t.html"));
        assert!(err.to_string().contains("shout"));
    }

    #[test]
    fn test_syntax_error() {
        let manager = manager("t.html", "{{#each items}}<p>{{description}}</p>");
        let err = manager.render("t.html", &data()).unwrap_err();
        assert!(matches!(err, LayoutError::TemplateSyntax { .. }));
        assert!(!manager.is_compiled("t.html"));
    }

    #[test]
    fn test_custom_helper() {
        fn stars(
            _: &handlebars::Helper,
            _: &Handlebars,
            _: &handlebars::Context,
            _: &mut handlebars::RenderContext,
            out: &mut dyn handlebars::Output,
        ) -> handlebars::HelperResult {
            out.write("***")?;
            Ok(())
        }

        let manager = manager("t.html", "{{stars}} {{number}}").with_helper("stars", stars);
        assert_eq!(manager.render("t.html", &data()).unwrap(), "*** INV-001");
    }

    #[test]
    fn test_manager_tries_sources_in_order() {
        let manager = TemplateManager::new()
            .with_source(MemorySource::new().with("a.html", "first"))
            .with_source(
                MemorySource::new()
                    .with("a.html", "second")
                    .with("b.html", "only here"),
            );

        assert_eq!(manager.load("a.html").unwrap(), "first");
        assert_eq!(manager.load("b.html").unwrap(), "only here");
        assert_eq!(manager.list_templates(), vec!["a.html", "b.html"]);
    }

    #[test]
    fn test_missing_template() {
        let manager = TemplateManager::new().with_source(MemorySource::new());
        let err = manager.render("nope.html", &data()).unwrap_err();
        assert!(
            matches!(err, LayoutError::TemplateNotFound { ref name, .. } if name == "nope.html")
        );

        let err = TemplateManager::new().load("nope.html").unwrap_err();
        assert!(err.to_string().contains("no template sources configured"));
    }

    #[test]
    fn test_fs_source_lists_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("invoice.html"), "<p>{{ number }}</p>").unwrap();
        std::fs::write(dir.path().join("nested/receipt.tmpl"), "x").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "skip").unwrap();

        let source = FsSource::new(dir.path());
        assert_eq!(
            source.list().unwrap(),
            vec!["invoice.html", "nested/receipt.tmpl"]
        );
        assert_eq!(source.load("nested/receipt.tmpl").unwrap(), "x");
        assert!(source.load("../escape.html").is_err());

        let manager = TemplateManager::new().with_source(source);
        assert_eq!(
            manager.render("invoice.html", &data()).unwrap(),
            "<p>INV-001</p>"
        );
    }

    #[test]
    fn test_compiled_template_survives_source_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.html");
        std::fs::write(&path, "cached {{number}}").unwrap();

        let manager = TemplateManager::new().with_source(FsSource::new(dir.path()));
        assert_eq!(manager.render("t.html", &data()).unwrap(), "cached INV-001");
        assert!(manager.is_compiled("t.html"));

        std::fs::remove_file(&path).unwrap();
        assert_eq!(manager.render("t.html", &data()).unwrap(), "cached INV-001");

        manager.clear_cache();
        assert!(manager.render("t.html", &data()).is_err());
    }
}
