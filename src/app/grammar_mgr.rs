// ZSleuth - app/grammar_mgr.rs
//
// Resolves the filename grammar for a pipeline: the embedded built-in,
// or a user TOML file that replaces it.

use crate::core::grammar::{self, FilenameGrammar};
use crate::core::model::PipelineKind;
use crate::platform::fs::{read_text_bounded, BoundedRead};
use crate::util::constants;
use crate::util::error::GrammarError;
use std::path::Path;

/// Load the grammar for `kind`, preferring `override_path` when given.
///
/// A user grammar that fails to load is an error, not a silent fallback to
/// the built-in: scanning with the wrong grammar would produce a plausible
/// but wrong table.
pub fn load_grammar(
    kind: PipelineKind,
    override_path: Option<&Path>,
) -> Result<FilenameGrammar, GrammarError> {
    let Some(path) = override_path else {
        return grammar::load_builtin_grammar(kind);
    };

    let content = match read_text_bounded(path, constants::MAX_GRAMMAR_FILE_SIZE) {
        Ok(BoundedRead::Content(c)) => c,
        Ok(BoundedRead::TooLarge { size }) => {
            return Err(GrammarError::FileTooLarge {
                path: path.to_path_buf(),
                size,
                max_size: constants::MAX_GRAMMAR_FILE_SIZE,
            });
        }
        Err(e) => {
            return Err(GrammarError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let def = grammar::parse_grammar_toml(&content, path)?;
    let compiled = grammar::validate_and_compile(def, path, false)?;
    tracing::info!(
        pipeline = %kind,
        grammar_id = %compiled.id,
        path = %path.display(),
        "Using user-defined grammar"
    );
    Ok(compiled)
}
