//! Model definitions used to clone a base model into prompt-pattern variants.
//!
//! A variant keeps the base weights and pins a fixed set of generation
//! parameters plus a pattern-specific system prompt.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::{Value, json};

/// Source of a derived model: base model, parameters and system prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFile {
    pub from: String,
    pub system: Option<String>,
    pub parameters: BTreeMap<String, Value>,
}

impl ModelFile {
    pub fn from_base(base: &str) -> Self {
        Self {
            from: base.to_string(),
            system: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_parameter(mut self, key: &str, value: Value) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }

    /// Renders the Modelfile text form, mostly for logs and debugging.
    pub fn render(&self) -> String {
        let mut out = format!("FROM {}\n", self.from);
        if !self.parameters.is_empty() {
            out.push('\n');
            for (k, v) in &self.parameters {
                let _ = writeln!(out, "PARAMETER {} {}", k, render_value(v));
            }
        }
        if let Some(system) = &self.system {
            let _ = write!(out, "\nSYSTEM \"\"\"\n{}\"\"\"\n", system);
        }
        out
    }
}

fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Generation parameters shared by every prompt-pattern variant.
pub fn pattern_parameters() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("temperature".to_string(), json!(0.1)),
        ("top_p".to_string(), json!(0.5)),
        ("top_k".to_string(), json!(40)),
        ("seed".to_string(), json!(1)),
    ])
}

const AI: &str = "# IDENTITY and PURPOSE

You interpret the intent behind a question and answer it with insight.

# STEPS

- Work out what is really being asked.
- Build a complete model of the input and the question before answering.
- Answer in 3-5 Markdown bullets of about 10 words each.

# OUTPUT INSTRUCTIONS

- Only output Markdown bullets.
- Do not output warnings or notes.

# INPUT:

INPUT:";

const CREATE_SUMMARY: &str = "# IDENTITY and PURPOSE

You summarize content into a Markdown report.

# OUTPUT SECTIONS

- ONE SENTENCE SUMMARY: the whole content in a single 20-word sentence.
- MAIN POINTS: the 10 most important points, at most 15 words each.
- TAKEAWAYS: the 5 best takeaways.

# OUTPUT INSTRUCTIONS

- Only output human readable Markdown.
- Use numbered lists, not bullets.
- Do not repeat items across sections.
- Do not output warnings or notes.

# INPUT:

INPUT:";

const EXPLAIN_CODE: &str = "# IDENTITY and PURPOSE

You are an experienced engineer who explains source code, security tool
output and configuration text.

# STEPS

- For code, explain what it does in a section called EXPLANATION:.
- For security tool output, explain the findings and their implications in a
  section called SECURITY IMPLICATIONS:.
- For configuration text, explain each setting in a section called
  CONFIGURATION EXPLANATION:.
- If a question accompanies the input, answer it in a section called ANSWER:.

# OUTPUT INSTRUCTIONS

- Only output Markdown.
- Do not output warnings or notes.

# INPUT:

INPUT:";

const TRANSLATE: &str = "# IDENTITY and PURPOSE

You translate text into the requested language while keeping the original
formatting.

# STEPS

- Read the whole input before translating.
- Translate sentence by sentence, preserving Markdown structure.
- Keep names, code and URLs unchanged.

# OUTPUT INSTRUCTIONS

- Output only the translation.
- Do not output warnings or notes.

# INPUT:

INPUT:";

const PATTERNS: &[(&str, &str)] = &[
    ("ai", AI),
    ("createSummary", CREATE_SUMMARY),
    ("explainCode", EXPLAIN_CODE),
    ("translate", TRANSLATE),
];

/// Names of the built-in prompt patterns.
pub fn known_patterns() -> impl Iterator<Item = &'static str> {
    PATTERNS.iter().map(|(name, _)| *name)
}

pub fn prompt_pattern(name: &str) -> Option<&'static str> {
    PATTERNS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, prompt)| *prompt)
}

/// Name of the variant cloned from `model` for `pattern`.
pub fn variant_name(model: &str, pattern: &str) -> String {
    format!("{}-{}", model, pattern)
}

/// Builds the definition of `<model>-<pattern>`, or `None` for an unknown
/// pattern.
pub fn pattern_variant(model: &str, pattern: &str) -> Option<ModelFile> {
    let system = prompt_pattern(pattern)?;
    Some(
        pattern_parameters()
            .into_iter()
            .fold(ModelFile::from_base(model).with_system(system), |file, (k, v)| {
                file.with_parameter(&k, v)
            }),
    )
}
