//! Template tree: the expected configuration keys and their validation rules.
//!
//! A template is an ordinary TOML document. Every table whose entries are all
//! tables is a section ([`TemplateNode::Node`]); every table with no table-valued
//! entries is a rule set ([`TemplateNode::Leaf`]). Inline tables are the usual
//! way to write rule sets:
//!
//! ```toml
//! [reddit.creds]
//! client_id = { optional = false, nmin = 12, nmax = 30, regex = "^[-a-zA-Z0-9._~+/]+=*$" }
//! password  = { optional = false, nmin = 8 }
//! ```
//!
//! Rule attributes the template does not recognize are logged and ignored.

use regex::Regex;
use serde::Deserialize;
use indexmap::IndexMap;
use toml::{Table, Value};

use crate::coerce::Coercion;
use crate::crawl::dotted;
use crate::error::ConfguardError;

/// The validation and display attributes attached to one configuration leaf.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub coercion: Option<Coercion>,
    pub options: Option<Vec<Value>>,
    pub pattern: Option<Pattern>,
    pub nmin: Option<f64>,
    pub nmax: Option<f64>,
    /// Only changes how the prompt is framed; acceptance is unaffected.
    pub optional: bool,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub explanation: Option<String>,
    pub input_error: Option<String>,
    pub oob_error: Option<String>,
}

impl RuleSet {
    /// True when the rule set carries no acceptance test at all.
    pub fn is_permissive(&self) -> bool {
        self.coercion.is_none()
            && self.options.is_none()
            && self.pattern.is_none()
            && self.nmin.is_none()
            && self.nmax.is_none()
    }
}

/// A regular expression matched from the start of the text.
///
/// A match at position 0 is enough; the rest of the text is not required to
/// match.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    anchored: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{source})"))?;
        Ok(Self {
            source: source.to_string(),
            anchored,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches_start(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }
}

#[derive(Debug, Clone)]
pub enum TemplateNode {
    Leaf(RuleSet),
    Node(IndexMap<String, TemplateNode>),
}

/// A parsed template document. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct Template {
    root: IndexMap<String, TemplateNode>,
}

impl Template {
    /// Parse template text. Errors name the offending key path.
    pub fn parse(content: &str) -> Result<Self, ConfguardError> {
        let table: Table = toml::from_str(content).map_err(|e| ConfguardError::TemplateParse {
            path: "<template>".into(),
            source: e,
        })?;
        Self::from_table(table)
    }

    pub fn from_table(table: Table) -> Result<Self, ConfguardError> {
        let mut root = IndexMap::new();
        for (key, value) in table {
            let path = vec![key.clone()];
            root.insert(key, parse_entry(&path, value)?);
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &IndexMap<String, TemplateNode> {
        &self.root
    }

    /// Look up the rule set at a key path.
    pub fn rules_at(&self, path: &[&str]) -> Option<&RuleSet> {
        let (last, parents) = path.split_last()?;
        let mut current = &self.root;
        for segment in parents {
            match current.get(*segment)? {
                TemplateNode::Node(children) => current = children,
                TemplateNode::Leaf(_) => return None,
            }
        }
        match current.get(*last)? {
            TemplateNode::Leaf(rules) => Some(rules),
            TemplateNode::Node(_) => None,
        }
    }

    pub fn leaf_count(&self) -> usize {
        fn count(nodes: &IndexMap<String, TemplateNode>) -> usize {
            nodes
                .values()
                .map(|node| match node {
                    TemplateNode::Leaf(_) => 1,
                    TemplateNode::Node(children) => count(children),
                })
                .sum()
        }
        count(&self.root)
    }
}

fn parse_entry(path: &[String], value: Value) -> Result<TemplateNode, ConfguardError> {
    let Value::Table(table) = value else {
        return Err(ConfguardError::InvalidTemplate {
            key: dotted(path),
            reason: format!("expected a table of rules, found {}", value.type_str()),
        });
    };

    let nested = table.values().filter(|v| v.is_table()).count();
    if nested == 0 {
        return parse_rule_set(path, table).map(TemplateNode::Leaf);
    }
    if nested != table.len() {
        return Err(ConfguardError::InvalidTemplate {
            key: dotted(path),
            reason: "section mixes nested tables with rule attributes".into(),
        });
    }

    let mut children = IndexMap::new();
    for (key, child) in table {
        let mut child_path = path.to_vec();
        child_path.push(key.clone());
        children.insert(key, parse_entry(&child_path, child)?);
    }
    Ok(TemplateNode::Node(children))
}

#[derive(Debug, Default, Deserialize)]
struct RawRuleSet {
    #[serde(rename = "type")]
    kind: Option<String>,
    options: Option<Vec<Value>>,
    regex: Option<String>,
    nmin: Option<f64>,
    nmax: Option<f64>,
    #[serde(default)]
    optional: bool,
    default: Option<Value>,
    example: Option<Value>,
    explanation: Option<String>,
    input_error: Option<String>,
    oob_error: Option<String>,
}

fn parse_rule_set(path: &[String], table: Table) -> Result<RuleSet, ConfguardError> {
    let key = dotted(path);
    let invalid = |reason: String| ConfguardError::InvalidTemplate {
        key: key.clone(),
        reason,
    };

    let mut ignored: Vec<String> = Vec::new();
    let raw: RawRuleSet = serde_ignored::deserialize(Value::Table(table), |attr| {
        ignored.push(attr.to_string());
    })
    .map_err(|e| invalid(e.to_string()))?;

    for attr in ignored {
        tracing::warn!(key = %key, attribute = %attr, "ignoring unknown rule attribute");
    }

    let coercion = raw
        .kind
        .as_deref()
        .map(str::parse::<Coercion>)
        .transpose()
        .map_err(invalid)?;
    let pattern = raw
        .regex
        .as_deref()
        .map(Pattern::new)
        .transpose()
        .map_err(|e| invalid(format!("invalid regex: {e}")))?;

    Ok(RuleSet {
        coercion,
        options: raw.options,
        pattern,
        nmin: raw.nmin,
        nmax: raw.nmax,
        optional: raw.optional,
        default: raw.default,
        example: raw.example,
        explanation: raw.explanation,
        input_error: raw.input_error,
        oob_error: raw.oob_error,
    })
}

/// Render a value the way an operator would type it.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        other => other.to_string(),
    }
}
