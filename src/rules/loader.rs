//! Declarative rule tables.
//! Loads a rule table from a YAML or JSON document. The document is checked
//! against a JSON schema first, then converted into the same [`RuleTable`]
//! built-in tables use, with MiniJinja expressions standing in for Rust
//! predicates and rename functions.

use super::{DestPath, FileSpec, InterpolatePattern, Mode, RuleBlock, RuleGroup, RuleTable};
use crate::error::{Error, Result};
use crate::renderer::TemplateRenderer;
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawBlock {
    condition: Option<String>,
    base_path: Option<String>,
    file_specs: Vec<RawFileSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFileSpec {
    Path(String),
    Spec(RawSpec),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSpec {
    source_id: String,
    dest_path: Option<RawDestPath>,
    #[serde(default)]
    mode: Mode,
    #[serde(default)]
    options: RawOptions,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDestPath {
    Fixed(String),
    Computed { computed: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOptions {
    interpolate_pattern: Option<String>,
}

/// JSON schema every declarative rule table must satisfy.
pub fn rule_table_schema() -> serde_json::Value {
    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "minProperties": 1,
        "additionalProperties": {
            "type": "array",
            "items": { "$ref": "#/definitions/block" }
        },
        "definitions": {
            "block": {
                "type": "object",
                "required": ["fileSpecs"],
                "additionalProperties": false,
                "properties": {
                    "condition": { "type": "string", "minLength": 1 },
                    "basePath": { "type": "string" },
                    "fileSpecs": {
                        "type": "array",
                        "items": { "$ref": "#/definitions/fileSpec" }
                    }
                }
            },
            "fileSpec": {
                "oneOf": [
                    { "type": "string", "minLength": 1 },
                    {
                        "type": "object",
                        "required": ["sourceId"],
                        "additionalProperties": false,
                        "properties": {
                            "sourceId": { "type": "string", "minLength": 1 },
                            "destPath": {
                                "oneOf": [
                                    { "type": "string", "minLength": 1 },
                                    {
                                        "type": "object",
                                        "required": ["computed"],
                                        "additionalProperties": false,
                                        "properties": {
                                            "computed": { "type": "string", "minLength": 1 }
                                        }
                                    }
                                ]
                            },
                            "mode": { "enum": ["interpolate", "copyText", "copyBinary"] },
                            "options": {
                                "type": "object",
                                "additionalProperties": false,
                                "properties": {
                                    "interpolatePattern": { "type": "string", "minLength": 1 }
                                }
                            }
                        }
                    }
                ]
            }
        }
    })
}

/// Validates a parsed document against [`rule_table_schema`].
///
/// # Errors
/// * `Error::RuleTableError` listing every violation
pub fn validate_document(document: &serde_json::Value) -> Result<()> {
    let schema = rule_table_schema();
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| Error::RuleTableError(format!("invalid rule table schema: {e}")))?;
    let violations: Vec<String> = validator.iter_errors(document).map(|e| e.to_string()).collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::RuleTableError(violations.join("; ")))
    }
}

fn convert_spec(raw: RawFileSpec) -> Result<FileSpec> {
    let raw = match raw {
        RawFileSpec::Path(path) => return Ok(FileSpec::Literal(path)),
        RawFileSpec::Spec(raw) => raw,
    };
    let mut spec = FileSpec::templated(raw.source_id).with_mode(raw.mode);
    if let Some(dest_path) = raw.dest_path {
        spec = spec.with_dest(match dest_path {
            RawDestPath::Fixed(path) => DestPath::Fixed(path),
            RawDestPath::Computed { computed } => DestPath::Rendered(computed),
        });
    }
    if let Some(pattern) = raw.options.interpolate_pattern {
        spec = spec.with_pattern(InterpolatePattern::parse(&pattern)?);
    }
    Ok(spec)
}

fn convert_block(raw: RawBlock) -> Result<RuleBlock> {
    Ok(RuleBlock {
        condition: raw.condition.map(super::Condition::Expression),
        base_path: raw.base_path,
        file_specs: raw.file_specs.into_iter().map(convert_spec).collect::<Result<_>>()?,
    })
}

/// Parses, schema-checks and structurally validates a rule table.
///
/// Group order follows the document.
pub fn parse_rules(content: &str, renderer: &dyn TemplateRenderer) -> Result<RuleTable> {
    let document: serde_json::Value = serde_yaml::from_str(content)
        .map_err(|e| Error::RuleTableError(format!("invalid rule table format: {e}")))?;
    validate_document(&document)?;

    let raw: IndexMap<String, Vec<RawBlock>> = serde_yaml::from_str(content)?;
    let groups = raw
        .into_iter()
        .map(|(name, blocks)| {
            let blocks = blocks.into_iter().map(convert_block).collect::<Result<_>>()?;
            Ok(RuleGroup { name, blocks })
        })
        .collect::<Result<Vec<_>>>()?;

    let table = RuleTable::new(groups);
    table.validate(renderer)?;
    Ok(table)
}

/// Loads a rule table file (`.yml`, `.yaml` or `.json`).
pub fn load_rules<P: AsRef<Path>>(path: P, renderer: &dyn TemplateRenderer) -> Result<RuleTable> {
    let path = path.as_ref();
    debug!("Loading rule table from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::RuleTableError(format!("cannot read '{}': {e}", path.display()))
    })?;
    parse_rules(&content, renderer)
}
