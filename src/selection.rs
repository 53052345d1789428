use std::collections::HashSet;
use std::io::Write as _;

use anyhow::Context as _;
use tokio::io::AsyncBufReadExt as _;

use crate::catalog::{Catalog, DocumentSpec, is_external_id_char};

/// Where the raw selection string comes from.
#[async_trait::async_trait]
pub trait SelectionSource {
    async fn read_selection(&mut self, catalog: &Catalog) -> anyhow::Result<String>;
}

/// Selection passed as the positional CLI argument.
#[derive(Debug, Clone)]
pub struct ArgumentSource(pub String);

#[async_trait::async_trait]
impl SelectionSource for ArgumentSource {
    async fn read_selection(&mut self, _catalog: &Catalog) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Prints the menu and reads a single line from stdin.
#[derive(Debug, Default)]
pub struct PromptSource;

#[async_trait::async_trait]
impl SelectionSource for PromptSource {
    async fn read_selection(&mut self, catalog: &Catalog) -> anyhow::Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}> ", menu(catalog)).context("write prompt")?;
        stdout.flush().context("flush prompt")?;

        let mut line = String::new();
        tokio::io::BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("read selection from stdin")?;
        Ok(line)
    }
}

pub fn menu(catalog: &Catalog) -> String {
    let mut out = String::from("Which documents should be built?\n");
    for doc in catalog.documents() {
        out.push_str(&format!(
            "{}. {}: {}\n",
            doc.ordinal, doc.name, doc.external_id
        ));
    }

    let example_ids = catalog
        .documents()
        .iter()
        .rev()
        .take(2)
        .map(|doc| abbreviate(&doc.external_id))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&format!(
        "\nEnter ordinals or document ids separated by commas (e.g. 1,3 or {example_ids})\n"
    ));
    out
}

fn abbreviate(id: &str) -> String {
    match id.char_indices().nth(8) {
        Some((idx, _)) => format!("{}...", &id[..idx]),
        None => id.to_owned(),
    }
}

/// Resolves a raw selection into catalog documents.
///
/// Tokens are separated by any character that cannot appear in a document
/// id. A token equal to a document id selects that document; any other
/// token is read as digit runs, each selecting by ordinal, so `2-1-3` and
/// `1a2` work like `2,1,3` and `1,2`. Unknown ordinals are ignored. The
/// result keeps first-occurrence order without duplicates.
pub fn resolve(catalog: &Catalog, raw: &str) -> Vec<DocumentSpec> {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    let mut select = |doc: &DocumentSpec| {
        if seen.insert(doc.external_id.clone()) {
            selected.push(doc.clone());
        }
    };

    for token in raw
        .split(|c: char| !is_external_id_char(c))
        .filter(|token| !token.is_empty())
    {
        if let Some(doc) = catalog.by_external_id(token) {
            select(doc);
            continue;
        }

        for digits in token
            .split(|c: char| !c.is_ascii_digit())
            .filter(|digits| !digits.is_empty())
        {
            match digits
                .parse::<u32>()
                .ok()
                .and_then(|ordinal| catalog.by_ordinal(ordinal))
            {
                Some(doc) => select(doc),
                None => tracing::debug!(token, digits, "ignoring unknown ordinal"),
            }
        }
    }

    selected
}
