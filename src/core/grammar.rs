// ZSleuth - core/grammar.rs
//
// Declarative filename grammars: loading, validation, compilation.
// Core layer: accepts TOML strings, never touches the filesystem.
// File I/O is handled by app::grammar_mgr which feeds content here.
//
// A grammar describes where the plate, well and Z fields sit inside an
// image file name using regexes with named capture groups, so a change
// of naming convention is a TOML edit rather than a code change.

use crate::core::model::PipelineKind;
use crate::util::constants;
use crate::util::error::GrammarError;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// TOML deserialization structures (raw input)
// =============================================================================

/// Raw TOML grammar definition as deserialized from a .toml file.
/// This is validated and compiled into a `FilenameGrammar` for runtime use.
#[derive(Debug, Deserialize)]
pub struct GrammarDefinition {
    pub grammar: GrammarMeta,
    #[serde(rename = "match")]
    pub rules: MatchDef,
}

#[derive(Debug, Deserialize)]
pub struct GrammarMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MatchDef {
    /// Literal substring a file name must contain before any regex runs.
    #[serde(default)]
    pub required_substring: Option<String>,
    /// Glob patterns on the bare file name; empty means "all names".
    #[serde(default)]
    pub file_patterns: Vec<String>,
    pub z_pattern: String,
    #[serde(default)]
    pub well_pattern: Option<String>,
    #[serde(default)]
    pub plate_prefix_len: Option<usize>,
}

// =============================================================================
// Compiled grammar
// =============================================================================

/// A validated, compiled filename grammar.
#[derive(Debug, Clone)]
pub struct FilenameGrammar {
    pub id: String,
    pub name: String,
    pub description: String,
    pub required_substring: Option<String>,
    pub file_patterns: Vec<glob::Pattern>,
    /// Always carries a `z` capture group.
    pub z_pattern: Regex,
    /// When present, always carries a `well` capture group.
    pub well_pattern: Option<Regex>,
    pub plate_prefix_len: Option<usize>,
    pub is_builtin: bool,
}

/// The fields the by-well pipeline needs, borrowed from a grammar.
#[derive(Debug, Clone, Copy)]
pub struct WellFields<'a> {
    pub well_pattern: &'a Regex,
    pub plate_prefix_len: usize,
}

impl FilenameGrammar {
    /// Borrow the well pattern and plate prefix length, failing if the
    /// grammar does not define them.
    pub fn well_fields(&self) -> Result<WellFields<'_>, GrammarError> {
        let well_pattern = self
            .well_pattern
            .as_ref()
            .ok_or_else(|| GrammarError::MissingField {
                grammar_id: self.id.clone(),
                field: "match.well_pattern",
            })?;
        let plate_prefix_len = self
            .plate_prefix_len
            .ok_or_else(|| GrammarError::MissingField {
                grammar_id: self.id.clone(),
                field: "match.plate_prefix_len",
            })?;
        Ok(WellFields {
            well_pattern,
            plate_prefix_len,
        })
    }

    /// True if the file name passes the glob filter (empty filter passes all).
    pub fn accepts_name(&self, file_name: &str) -> bool {
        self.file_patterns.is_empty() || self.file_patterns.iter().any(|p| p.matches(file_name))
    }
}

// =============================================================================
// Validation and compilation
// =============================================================================

/// Parse a TOML string into a `GrammarDefinition`.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_grammar_toml(
    toml_content: &str,
    source_path: &Path,
) -> Result<GrammarDefinition, GrammarError> {
    toml::from_str(toml_content).map_err(|e| GrammarError::TomlParse {
        path: source_path.to_path_buf(),
        source: e,
    })
}

/// Validate a `GrammarDefinition` and compile it into a `FilenameGrammar`.
///
/// Validates:
/// - id, name and z_pattern are present and non-empty
/// - regexes compile, stay under the length cap, and carry their groups
/// - plate_prefix_len is non-zero when given
/// - file_patterns are valid globs
pub fn validate_and_compile(
    def: GrammarDefinition,
    source_path: &Path,
    is_builtin: bool,
) -> Result<FilenameGrammar, GrammarError> {
    let id = &def.grammar.id;

    if id.is_empty() {
        return Err(GrammarError::MissingField {
            grammar_id: "(empty)".to_string(),
            field: "grammar.id",
        });
    }
    if def.grammar.name.is_empty() {
        return Err(GrammarError::MissingField {
            grammar_id: id.clone(),
            field: "grammar.name",
        });
    }
    if def.rules.z_pattern.is_empty() {
        return Err(GrammarError::MissingField {
            grammar_id: id.clone(),
            field: "match.z_pattern",
        });
    }

    let z_pattern = compile_regex(id, "match.z_pattern", &def.rules.z_pattern)?;
    require_group(id, "match.z_pattern", &z_pattern, constants::Z_GROUP)?;

    let well_pattern = match def.rules.well_pattern.as_deref() {
        None | Some("") => None,
        Some(pattern) => {
            let re = compile_regex(id, "match.well_pattern", pattern)?;
            require_group(id, "match.well_pattern", &re, constants::WELL_GROUP)?;
            Some(re)
        }
    };

    if def.rules.plate_prefix_len == Some(0) {
        return Err(GrammarError::ZeroPlatePrefix {
            grammar_id: id.clone(),
        });
    }

    let file_patterns = def
        .rules
        .file_patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| GrammarError::InvalidGlob {
                grammar_id: id.clone(),
                pattern: p.clone(),
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let required_substring = def.rules.required_substring.filter(|s| !s.is_empty());

    tracing::debug!(
        grammar_id = %id,
        source = %source_path.display(),
        has_well = well_pattern.is_some(),
        "Grammar compiled"
    );

    Ok(FilenameGrammar {
        id: id.clone(),
        name: def.grammar.name,
        description: def.grammar.description,
        required_substring,
        file_patterns,
        z_pattern,
        well_pattern,
        plate_prefix_len: def.rules.plate_prefix_len,
        is_builtin,
    })
}

/// Compile a regex pattern with length validation to prevent ReDoS.
fn compile_regex(
    grammar_id: &str,
    field: &'static str,
    pattern: &str,
) -> Result<Regex, GrammarError> {
    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(GrammarError::RegexTooLong {
            grammar_id: grammar_id.to_string(),
            field,
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }

    Regex::new(pattern).map_err(|e| GrammarError::InvalidRegex {
        grammar_id: grammar_id.to_string(),
        field,
        pattern: pattern.to_string(),
        source: e,
    })
}

fn require_group(
    grammar_id: &str,
    field: &'static str,
    re: &Regex,
    group: &'static str,
) -> Result<(), GrammarError> {
    if re.capture_names().flatten().any(|name| name == group) {
        Ok(())
    } else {
        Err(GrammarError::MissingCaptureGroup {
            grammar_id: grammar_id.to_string(),
            field,
            group,
        })
    }
}

// =============================================================================
// Built-in grammars (embedded at compile time)
// =============================================================================

/// Embedded TOML source of the built-in grammar for a pipeline.
pub fn builtin_grammar_source(kind: PipelineKind) -> (&'static str, &'static str) {
    match kind {
        PipelineKind::ByWell => ("by_well.toml", include_str!("../../grammars/by_well.toml")),
        PipelineKind::BySubfolder => (
            "by_subfolder.toml",
            include_str!("../../grammars/by_subfolder.toml"),
        ),
    }
}

/// Load and validate the built-in grammar for a pipeline.
pub fn load_builtin_grammar(kind: PipelineKind) -> Result<FilenameGrammar, GrammarError> {
    let (filename, content) = builtin_grammar_source(kind);
    let path = std::path::PathBuf::from(format!("<builtin>/{filename}"));
    let grammar = parse_grammar_toml(content, &path)
        .and_then(|def| validate_and_compile(def, &path, true))?;
    tracing::debug!(grammar_id = %grammar.id, "Loaded built-in grammar");
    Ok(grammar)
}

// =============================================================================
// Tests
// =============================================================================
