use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// A document that can be exported with `claat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSpec {
    pub ordinal: u32,
    pub name: String,
    pub external_id: String,
    /// Output directory, relative to the build root.
    pub output_dir: String,
}

impl DocumentSpec {
    fn new(ordinal: u32, name: &str, external_id: &str, output_dir: &str) -> Self {
        Self {
            ordinal,
            name: name.to_owned(),
            external_id: external_id.to_owned(),
            output_dir: output_dir.to_owned(),
        }
    }

    pub fn output_path(&self, root: &Path) -> PathBuf {
        root.join(&self.output_dir)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    documents: Vec<DocumentSpec>,
}

/// Ordered, immutable list of the documents known to the build.
#[derive(Debug, Clone)]
pub struct Catalog {
    documents: Vec<DocumentSpec>,
}

impl Catalog {
    pub fn new(documents: Vec<DocumentSpec>) -> anyhow::Result<Self> {
        if documents.is_empty() {
            anyhow::bail!("catalog must contain at least one document");
        }

        let mut ordinals = HashSet::new();
        let mut ids = HashSet::new();
        for doc in &documents {
            if doc.ordinal == 0 {
                anyhow::bail!("document ordinal must be >= 1: {}", doc.name);
            }
            if !ordinals.insert(doc.ordinal) {
                anyhow::bail!("duplicate document ordinal: {}", doc.ordinal);
            }
            if !is_external_id(&doc.external_id) {
                anyhow::bail!(
                    "document id must be non-empty and use [A-Za-z0-9_-]: {:?}",
                    doc.external_id
                );
            }
            if !ids.insert(doc.external_id.as_str()) {
                anyhow::bail!("duplicate document id: {}", doc.external_id);
            }
            ensure_relative_dir(&doc.output_dir)
                .with_context(|| format!("document output_dir: {}", doc.name))?;
        }

        Ok(Self { documents })
    }

    pub fn builtin() -> Self {
        Self {
            documents: vec![
                DocumentSpec::new(
                    1,
                    "glean-search",
                    "16x-OdU8ooq3FszzRhmj-8hLzJejvYKGIVADoPWnlvos",
                    "1-glean-search",
                ),
                DocumentSpec::new(
                    2,
                    "glean-chat",
                    "1AYqOEx4SQ9UgA_0fSpwV0ydjjBLhK1sv1-r8uuje07w",
                    "2-glean-assistant",
                ),
                DocumentSpec::new(
                    3,
                    "glean-agent",
                    "1tw7IPtWMpOumljfOmLRrQ3O_P8Fxt7U5rT8BpFCnA6w",
                    "3-glean-agents",
                ),
            ],
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog: {}", path.display()))?;
        let file: CatalogFile = serde_yaml::from_str(&yaml)
            .with_context(|| format!("parse catalog: {}", path.display()))?;
        Self::new(file.documents).with_context(|| format!("validate catalog: {}", path.display()))
    }

    /// Loads `path` when given, otherwise falls back to the built-in documents.
    pub fn load_or_builtin(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn documents(&self) -> &[DocumentSpec] {
        &self.documents
    }

    pub fn by_ordinal(&self, ordinal: u32) -> Option<&DocumentSpec> {
        self.documents.iter().find(|doc| doc.ordinal == ordinal)
    }

    pub fn by_external_id(&self, external_id: &str) -> Option<&DocumentSpec> {
        self.documents
            .iter()
            .find(|doc| doc.external_id == external_id)
    }

    /// HTML files touched by the favicon pass: the site index, then each
    /// document's index in catalog order.
    pub fn favicon_targets(&self, root: &Path) -> Vec<PathBuf> {
        std::iter::once(root.join("index.html"))
            .chain(
                self.documents
                    .iter()
                    .map(|doc| doc.output_path(root).join("index.html")),
            )
            .collect()
    }
}

pub(crate) fn is_external_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_external_id(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_external_id_char)
}

fn ensure_relative_dir(dir: &str) -> anyhow::Result<()> {
    let path = Path::new(dir);
    if dir.is_empty() {
        anyhow::bail!("output directory must not be empty");
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => anyhow::bail!("output directory must be relative without '..': {dir}"),
        }
    }
    Ok(())
}
