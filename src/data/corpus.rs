//! Token corpus loading.
//!
//! Maps a short corpus identifier to a file under the corpus root, decodes
//! it into `TokenDescriptor`s and applies the requested slice.
//!
//! Three file shapes are accepted:
//! - An object keyed by address with metadata objects as values
//! - An array of address strings
//! - An array of descriptor objects (`address`, `name`, `symbol`, `decimals`)
//!
//! Anything else is a `CorpusParseError`.

use crate::{ClassifierError, TokenDescriptor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Known corpora
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusId {
    /// Top-ranked tokens from awesome-buggy-erc20-tokens
    BadTop,
    /// Every token from awesome-buggy-erc20-tokens
    BadAll,
    /// Locally curated top tokens by market cap
    Top,
}

impl CorpusId {
    pub const ALL: [CorpusId; 3] = [CorpusId::BadTop, CorpusId::BadAll, CorpusId::Top];

    /// Validate a corpus identifier against the allow-list
    pub fn parse(id: &str) -> Result<Self, ClassifierError> {
        CorpusId::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == id)
            .ok_or_else(|| ClassifierError::UnknownCorpus {
                corpus: id.to_string(),
                known: CorpusId::ALL
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorpusId::BadTop => "bad-top",
            CorpusId::BadAll => "bad-all",
            CorpusId::Top => "top",
        }
    }

    /// Location relative to the corpus root
    pub fn relative_path(&self) -> &'static str {
        match self {
            CorpusId::BadTop => "lib/awesome-buggy-erc20-tokens/bad_tokens.top.json",
            CorpusId::BadAll => "lib/awesome-buggy-erc20-tokens/bad_tokens.all.json",
            CorpusId::Top => "tokens/top_tokens.json",
        }
    }

    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }
}

impl fmt::Display for CorpusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Keyed(Map<String, Value>),
    Addresses(Vec<String>),
    Descriptors(Vec<TokenDescriptor>),
}

/// Load `count` descriptors starting at `offset` from a named corpus.
///
/// The slice is clamped to the corpus: an offset past the end yields an
/// empty list, never an error.
pub fn load_addresses(
    root: &Path,
    corpus_id: &str,
    offset: usize,
    count: usize,
) -> Result<Vec<TokenDescriptor>, ClassifierError> {
    let corpus = CorpusId::parse(corpus_id)?;
    let tokens = load_corpus_file(&corpus.path_in(root))?;
    log::debug!("Corpus '{}' holds {} token(s)", corpus, tokens.len());
    Ok(tokens.into_iter().skip(offset).take(count).collect())
}

/// Load and normalize every descriptor in a corpus file
pub fn load_corpus_file(path: &Path) -> Result<Vec<TokenDescriptor>, ClassifierError> {
    let parse_error = |message: String| ClassifierError::CorpusParseError {
        path: path.to_path_buf(),
        message,
    };

    let content = fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
    let file: CorpusFile = serde_json::from_value(value).map_err(|_| {
        parse_error(
            "expected an object keyed by address, an array of addresses, or an array of descriptors"
                .to_string(),
        )
    })?;

    let tokens = match file {
        CorpusFile::Keyed(entries) => entries
            .into_iter()
            .map(|(address, meta)| descriptor_from_entry(address, &meta))
            .collect(),
        CorpusFile::Addresses(addresses) => {
            addresses.into_iter().map(TokenDescriptor::new).collect()
        }
        CorpusFile::Descriptors(descriptors) => descriptors,
    };

    Ok(tokens.into_iter().map(clean_descriptor).collect())
}

fn descriptor_from_entry(address: String, meta: &Value) -> TokenDescriptor {
    let field = |key: &str| meta.get(key).and_then(scalar_to_string);
    TokenDescriptor {
        address,
        name: field("name"),
        symbol: field("symbol"),
        decimals: field("decimals"),
    }
}

// Blank metadata counts as absent
fn clean_descriptor(token: TokenDescriptor) -> TokenDescriptor {
    let clean = |v: Option<String>| {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    TokenDescriptor {
        address: token.address.trim().to_string(),
        name: clean(token.name),
        symbol: clean(token.symbol),
        decimals: clean(token.decimals),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decimals appear as either a number or a string in corpus files
pub fn deserialize_decimals<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}
