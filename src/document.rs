use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// The part of an agent configuration file that this process owns. Everything
/// outside of `KEY` is kept as an opaque YAML tree and written back as-is.
pub trait Section: Serialize + DeserializeOwned + Default + Clone {
    /// Top level key of the section inside the document.
    const KEY: &'static str;
}

/// A complete agent configuration file: the untouched YAML tree plus the typed
/// section that gets mutated.
#[derive(Debug)]
pub struct Document<S: Section> {
    path: PathBuf,
    root: Mapping,
    section: S,
}

impl<S: Section> Document<S> {
    /// Load the document at `path`. A missing or empty section is treated as
    /// an empty one, it will be added on the first write.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Unable to read {}", path.display()))?;

        Self::from_yaml(path, &content)
    }

    fn from_yaml(path: PathBuf, content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Document {
                path,
                root: Mapping::new(),
                section: S::default(),
            });
        }

        let root = match serde_yaml::from_str::<Value>(content)
            .with_context(|| format!("Unable to parse {}", path.display()))?
        {
            Value::Mapping(root) => root,
            Value::Null => Mapping::new(),
            _ => bail!("{} does not contain a YAML mapping", path.display()),
        };

        let section = match root.get(S::KEY) {
            None | Some(Value::Null) => S::default(),
            Some(value) => serde_yaml::from_value(value.clone()).with_context(|| {
                format!("Unable to parse `{}` in {}", S::KEY, path.display())
            })?,
        };

        Ok(Document {
            path,
            root,
            section,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The section as it was last written (or loaded).
    pub fn section(&self) -> &S {
        &self.section
    }

    /// Render the full document with `section` in place of the owned key. The
    /// position of the key in the root mapping is kept.
    ///
    /// Mappings are indented by two spaces and block sequences are written
    /// flush with their parent key (`key:\n- item`). Both agents read either
    /// layout, but a hand written file that indents its sequences changes
    /// shape on the first write.
    pub fn to_yaml(&self, section: &S) -> Result<String> {
        let mut root = self.root.clone();
        root.insert(
            Value::String(S::KEY.to_string()),
            serde_yaml::to_value(section)
                .with_context(|| format!("Unable to serialize `{}`", S::KEY))?,
        );

        serde_yaml::to_string(&root).context("Unable to serialize document")
    }

    /// Write the full document with `section` to disk and make it the current
    /// section. Nothing changes in memory when the write fails.
    ///
    /// The content is written to a temporary file next to the target which is
    /// then renamed over it, so the agent never reads a half written file.
    pub fn persist(&mut self, section: S) -> Result<()> {
        let yaml = self.to_yaml(&section)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir)
            .with_context(|| format!("Unable to create temporary file in {}", dir.display()))?;
        file.write_all(yaml.as_bytes())
            .context("Unable to write temporary file")?;

        // The agents usually run as a different user.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o664))
                .context("Unable to set permissions on temporary file")?;
        }

        file.persist(&self.path)
            .with_context(|| format!("Unable to replace {}", self.path.display()))?;

        debug!(path = ?self.path, key = S::KEY, "Persisted document");

        self.section = section;
        Ok(())
    }
}
