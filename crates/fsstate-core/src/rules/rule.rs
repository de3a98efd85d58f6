//! RuleNode: one desired-state declaration
//!
//! Field names follow the rule document: `file_type` selects the entry kind.
//! Unknown keys are ignored.

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::ownership::Ownership;

/// What kind of filesystem entry a rule manages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

/// Whether the entry should exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

/// A desired-state declaration for one path, relative to its base directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleNode {
    pub path: String,
    #[serde(default, rename = "file_type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub state: EntryState,
    /// Exact file content; only used by present files.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub group: Option<String>,
    /// Octal literal, validated when the rule is applied.
    #[serde(default, deserialize_with = "string_or_number")]
    pub mode: Option<String>,
    #[serde(default)]
    pub recurse: bool,
    #[serde(default)]
    pub children: Vec<RuleNode>,
}

impl RuleNode {
    /// A present file rule with no content, owner or mode.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            state: EntryState::Present,
            content: None,
            owner: None,
            group: None,
            mode: None,
            recurse: false,
            children: Vec::new(),
        }
    }

    /// A present directory rule.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Directory,
            ..Self::file(path)
        }
    }

    pub fn absent(mut self) -> Self {
        self.state = EntryState::Absent;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>, group: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self.group = Some(group.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Mark the rule recursive and set its children.
    pub fn with_children(mut self, children: Vec<RuleNode>) -> Self {
        self.recurse = true;
        self.children = children;
        self
    }

    /// The requested ownership, only when both owner and group are given.
    pub fn ownership(&self) -> Option<Ownership> {
        match (&self.owner, &self.group) {
            (Some(owner), Some(group)) => Some(Ownership::new(owner, group)),
            _ => None,
        }
    }

    /// Exactly one of owner/group was given; such a rule changes no ownership.
    pub fn has_partial_ownership(&self) -> bool {
        self.owner.is_some() != self.group.is_some()
    }

    /// Whether the reconciler descends into `children` for this rule.
    pub fn recurses(&self) -> bool {
        self.kind == EntryKind::Directory && self.state == EntryState::Present && self.recurse
    }
}

/// Accept `owner: 1000` and `mode: 755` as well as their quoted forms.
///
/// Integers keep their decimal spelling, so an unquoted `755` is read as the
/// octal literal `"755"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Number(number) => number.to_string(),
    }))
}
