//! README templates: compiled-in built-ins plus user `*.md` files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tracing::debug;

use super::config::config_path;
use super::markdown::write_markdown;

const BUILTIN: &[(&str, &str)] = &[
    ("basic", include_str!("templates/basic.md")),
    ("detailed", include_str!("templates/detailed.md")),
    ("minimal", include_str!("templates/minimal.md")),
];

/// Where a template came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Builtin,
    User(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub source: TemplateSource,
    pub body: String,
}

/// Built-in templates plus user templates stored in one directory.
///
/// A user template with a built-in's name shadows the built-in.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    user_dir: PathBuf,
}

impl TemplateStore {
    pub fn new(user_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
        }
    }

    /// Store rooted next to the config file (`<config dir>/templates`).
    pub fn from_config_location() -> Result<Self> {
        let path = config_path()?;
        let dir = path
            .parent()
            .with_context(|| format!("config path missing parent {}", path.display()))?;
        Ok(Self::new(dir.join("templates")))
    }

    pub fn user_dir(&self) -> &Path {
        &self.user_dir
    }

    /// All templates, sorted by name.
    pub fn list(&self) -> Result<Vec<Template>> {
        let mut templates: Vec<Template> = BUILTIN
            .iter()
            .map(|(name, body)| builtin(name, body))
            .collect();
        for user in self.user_templates()? {
            templates.retain(|t| t.name != user.name);
            templates.push(user);
        }
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    pub fn get(&self, name: &str) -> Result<Template> {
        validate_name(name)?;
        let path = self.user_path(name);
        if path.is_file() {
            let body = fs::read_to_string(&path)
                .with_context(|| format!("read template {}", path.display()))?;
            return Ok(Template {
                name: name.to_string(),
                source: TemplateSource::User(path),
                body,
            });
        }
        BUILTIN
            .iter()
            .find(|(builtin_name, _)| *builtin_name == name)
            .map(|(name, body)| builtin(name, body))
            .ok_or_else(|| anyhow!("unknown template `{name}` (see `qmims templates list`)"))
    }

    /// Copy `source` into the user directory as `<name>.md`.
    pub fn add(&self, name: &str, source: &Path, force: bool) -> Result<PathBuf> {
        validate_name(name)?;
        let body = fs::read_to_string(source)
            .with_context(|| format!("read template source {}", source.display()))?;
        let dest = self.user_path(name);
        if dest.exists() && !force {
            bail!("template `{name}` already exists at {}", dest.display());
        }
        write_markdown(&dest, &body)?;
        debug!(name, path = %dest.display(), "template added");
        Ok(dest)
    }

    /// Delete a user template. Built-ins cannot be removed.
    pub fn remove(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.user_path(name);
        if !path.is_file() {
            if BUILTIN.iter().any(|(builtin_name, _)| *builtin_name == name) {
                bail!("template `{name}` is built in and cannot be removed");
            }
            bail!("unknown template `{name}`");
        }
        fs::remove_file(&path).with_context(|| format!("remove template {}", path.display()))?;
        Ok(path)
    }

    fn user_path(&self, name: &str) -> PathBuf {
        self.user_dir.join(format!("{name}.md"))
    }

    fn user_templates(&self) -> Result<Vec<Template>> {
        if !self.user_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.user_dir)
            .with_context(|| format!("read {}", self.user_dir.display()))?
        {
            let path = entry.context("read template entry")?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") || !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let body = fs::read_to_string(&path)
                .with_context(|| format!("read template {}", path.display()))?;
            found.push(Template {
                name: name.to_string(),
                source: TemplateSource::User(path.clone()),
                body,
            });
        }
        Ok(found)
    }
}

fn builtin(name: &str, body: &str) -> Template {
    Template {
        name: name.to_string(),
        source: TemplateSource::Builtin,
        body: body.to_string(),
    }
}

/// Template names become file names; keep them to a safe alphabet.
fn validate_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok {
        bail!("invalid template name `{name}` (use letters, digits, '-' or '_')");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_builtins_in_name_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = TemplateStore::new(temp.path().join("templates"));
        let names: Vec<_> = store
            .list()
            .expect("list")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["basic", "detailed", "minimal"]);
    }

    #[test]
    fn user_template_shadows_builtin() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = TemplateStore::new(temp.path().join("templates"));
        let source = temp.path().join("mine.md");
        fs::write(&source, "# Custom\n").expect("write");

        store.add("basic", &source, false).expect("add");
        let basic = store.get("basic").expect("get");
        assert_eq!(basic.body, "# Custom\n");
        assert!(matches!(basic.source, TemplateSource::User(_)));
        assert_eq!(store.list().expect("list").len(), 3);
    }

    #[test]
    fn add_refuses_overwrite_without_force() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = TemplateStore::new(temp.path().join("templates"));
        let source = temp.path().join("api.md");
        fs::write(&source, "# API\n").expect("write");

        store.add("api", &source, false).expect("add");
        assert!(store.add("api", &source, false).is_err());
        store.add("api", &source, true).expect("force add");
    }

    #[test]
    fn add_creates_missing_user_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = TemplateStore::new(temp.path().join("config").join("qmims").join("templates"));
        let source = temp.path().join("cli.md");
        fs::write(&source, "# CLI\n").expect("write");

        let dest = store.add("cli", &source, false).expect("add");
        assert_eq!(dest, temp.path().join("config/qmims/templates/cli.md"));
        assert_eq!(fs::read_to_string(&dest).expect("read"), "# CLI\n");
    }

    #[test]
    fn remove_only_touches_user_templates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = TemplateStore::new(temp.path().join("templates"));
        let err = store.remove("minimal").unwrap_err();
        assert!(err.to_string().contains("built in"));

        let source = temp.path().join("lib.md");
        fs::write(&source, "# Lib\n").expect("write");
        store.add("lib", &source, false).expect("add");
        store.remove("lib").expect("remove");
        assert!(store.get("lib").is_err());
    }

    #[test]
    fn rejects_path_like_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = TemplateStore::new(temp.path());
        assert!(store.get("../secret").is_err());
        assert!(store.get("").is_err());
    }
}
