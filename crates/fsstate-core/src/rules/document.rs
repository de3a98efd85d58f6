//! Rule documents
//!
//! A document is either a bare sequence of rules (the usual YAML/JSON shape)
//! or a table with a `rules` key, which is the only shape TOML can express.

use std::fmt;
use std::path::{Path, PathBuf};

use fsstate_fs::{ConfigStore, Format, NormalizedPath};
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

use super::{EntryState, RuleNode};
use crate::error::{Error, Result};
use crate::mode::FileMode;

/// An ordered, parsed list of top-level rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleDocument {
    rules: Vec<RuleNode>,
}

impl RuleDocument {
    pub fn new(rules: Vec<RuleNode>) -> Self {
        Self { rules }
    }

    /// Load a document, picking the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = NormalizedPath::new(path);
        let document: Self = ConfigStore::new().load(&path)?;
        tracing::debug!(path = %path, rules = document.len(), "loaded rule document");
        Ok(document)
    }

    /// Parse a document held in memory.
    pub fn parse(content: &str, format: Format) -> Result<Self> {
        let origin = NormalizedPath::new("<inline>");
        Ok(ConfigStore::new().parse(content, format, &origin)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::parse(content, Format::Yaml)
    }

    pub fn rules(&self) -> &[RuleNode] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<RuleNode> {
        self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check every `mode` of a present rule without touching the filesystem.
    ///
    /// Errors carry the rule path joined with its ancestors' paths, relative
    /// to the base directory.
    pub fn validate(&self) -> Result<()> {
        validate_rules(&self.rules, Path::new(""))
    }
}

fn validate_rules(rules: &[RuleNode], parent: &Path) -> Result<()> {
    for rule in rules {
        let location: PathBuf = parent.join(&rule.path);
        if let (EntryState::Present, Some(raw)) = (rule.state, &rule.mode) {
            raw.parse::<FileMode>().map_err(|e| Error::ModeParse {
                path: location.clone(),
                mode: e.mode,
            })?;
        }
        if rule.recurses() {
            validate_rules(&rule.children, &location)?;
        }
    }
    Ok(())
}

impl<'de> Deserialize<'de> for RuleDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = RuleDocument;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sequence of rules or a table with a `rules` key")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(RuleDocument::default())
    }

    fn visit_seq<A>(self, seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let rules = Vec::<RuleNode>::deserialize(de::value::SeqAccessDeserializer::new(seq))?;
        Ok(RuleDocument { rules })
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut rules = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == "rules" {
                if rules.is_some() {
                    return Err(de::Error::duplicate_field("rules"));
                }
                rules = Some(map.next_value::<Vec<RuleNode>>()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        let rules = rules.ok_or_else(|| de::Error::missing_field("rules"))?;
        Ok(RuleDocument { rules })
    }
}
