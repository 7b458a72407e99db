// ZSleuth - core/extract.rs
//
// Field extraction from image file names using a compiled grammar.
//
// Extraction is a partial function: a file that misses any required
// pattern yields `Extraction::Skipped` with the reason, never a record
// with defaulted fields. Only a capture that matched but cannot be
// converted is an error, and it aborts the scan.

use crate::core::grammar::{FilenameGrammar, WellFields};
use crate::core::model::{SkipReason, SubfolderRecord, WellRecord};
use crate::util::constants;
use crate::util::error::ExtractError;
use std::path::Path;

/// Outcome of running a grammar over one file name.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<R> {
    Matched(R),
    Skipped(SkipReason),
}

impl<R> Extraction<R> {
    /// The record, if the file matched.
    pub fn into_record(self) -> Option<R> {
        match self {
            Extraction::Matched(r) => Some(r),
            Extraction::Skipped(_) => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Extraction::Matched(_))
    }
}

// =============================================================================
// By-well extraction
// =============================================================================

/// Derive a `WellRecord` from a file name.
///
/// Steps: gate on the required substring and file patterns, capture the
/// well token and Z text, take the plate prefix, then truncate Z toward
/// zero. `path` is stored on the record and used in error messages.
pub fn extract_well_record(
    file_name: &str,
    path: &Path,
    grammar: &FilenameGrammar,
    fields: WellFields<'_>,
) -> Result<Extraction<WellRecord>, ExtractError> {
    if let Some(reason) = gate(file_name, grammar) {
        return Ok(Extraction::Skipped(reason));
    }

    let Some(well) = capture(fields.well_pattern, file_name, constants::WELL_GROUP) else {
        return Ok(Extraction::Skipped(SkipReason::NoWellMatch));
    };
    let Some(raw_z) = capture(&grammar.z_pattern, file_name, constants::Z_GROUP) else {
        return Ok(Extraction::Skipped(SkipReason::NoZMatch));
    };

    let plate_name =
        char_prefix(file_name, fields.plate_prefix_len).ok_or_else(|| {
            ExtractError::PlateNameTooShort {
                file: path.to_path_buf(),
                length: file_name.chars().count(),
                required: fields.plate_prefix_len,
            }
        })?;

    let z_value = truncate_z(parse_z(raw_z, path)?, path)?;

    Ok(Extraction::Matched(WellRecord {
        plate_name: plate_name.to_string(),
        well_position: well.to_string(),
        z_value,
        file_name: file_name.to_string(),
        path: path.to_path_buf(),
    }))
}

// =============================================================================
// By-subfolder extraction
// =============================================================================

/// Derive a `SubfolderRecord` from a file name found in `dir` under `root`.
pub fn extract_subfolder_record(
    file_name: &str,
    path: &Path,
    dir: &Path,
    root: &Path,
    grammar: &FilenameGrammar,
) -> Result<Extraction<SubfolderRecord>, ExtractError> {
    if let Some(reason) = gate(file_name, grammar) {
        return Ok(Extraction::Skipped(reason));
    }

    let Some(raw_z) = capture(&grammar.z_pattern, file_name, constants::Z_GROUP) else {
        return Ok(Extraction::Skipped(SkipReason::NoZMatch));
    };
    let z_value = parse_z(raw_z, path)?;

    Ok(Extraction::Matched(SubfolderRecord {
        z_value,
        subfolder_tag: subfolder_tag(dir, root),
        file_name: file_name.to_string(),
        path: path.to_path_buf(),
    }))
}

/// First `_`-delimited token of the top-level directory of `dir` relative
/// to `root`. Files in the root itself are tagged `"."`.
pub fn subfolder_tag(dir: &Path, root: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    match relative.components().next() {
        Some(top) => {
            let top = top.as_os_str().to_string_lossy();
            top.split('_').next().unwrap_or_default().to_string()
        }
        None => constants::ROOT_SUBFOLDER_TAG.to_string(),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn gate(file_name: &str, grammar: &FilenameGrammar) -> Option<SkipReason> {
    if let Some(ref needle) = grammar.required_substring {
        if !file_name.contains(needle.as_str()) {
            return Some(SkipReason::MissingSubstring);
        }
    }
    if !grammar.accepts_name(file_name) {
        return Some(SkipReason::PatternFilter);
    }
    None
}

fn capture<'h>(re: &regex::Regex, haystack: &'h str, group: &str) -> Option<&'h str> {
    re.captures(haystack)
        .and_then(|caps| caps.name(group))
        .map(|m| m.as_str())
}

/// The first `n` characters of `s`, or `None` if `s` is shorter.
fn char_prefix(s: &str, n: usize) -> Option<&str> {
    match s.char_indices().nth(n) {
        Some((end, _)) => Some(&s[..end]),
        None if s.chars().count() == n => Some(s),
        None => None,
    }
}

fn parse_z(raw: &str, path: &Path) -> Result<f64, ExtractError> {
    raw.parse::<f64>().map_err(|e| ExtractError::InvalidZValue {
        file: path.to_path_buf(),
        raw: raw.to_string(),
        source: e,
    })
}

/// Truncate toward zero (8267.99 -> 8267), not round.
fn truncate_z(value: f64, path: &Path) -> Result<i64, ExtractError> {
    let t = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if !t.is_finite() || t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return Err(ExtractError::ZOutOfRange {
            file: path.to_path_buf(),
            value,
        });
    }
    Ok(t as i64)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grammar::load_builtin_grammar;
    use crate::core::model::PipelineKind;
    use std::path::PathBuf;

    const GOOD: &str = "P2345678_0001_A_G02_165dot5_Z8267.99_GFP-ref.tif";

    fn well(name: &str) -> Result<Extraction<WellRecord>, ExtractError> {
        let grammar = load_builtin_grammar(PipelineKind::ByWell).unwrap();
        let fields = grammar.well_fields().unwrap();
        extract_well_record(name, &PathBuf::from("/run").join(name), &grammar, fields)
    }

    fn subfolder(name: &str, dir: &str) -> Result<Extraction<SubfolderRecord>, ExtractError> {
        let grammar = load_builtin_grammar(PipelineKind::BySubfolder).unwrap();
        let dir = PathBuf::from(dir);
        extract_subfolder_record(name, &dir.join(name), &dir, Path::new("/run"), &grammar)
    }

    #[test]
    fn test_well_record_fields() {
        let rec = well(GOOD).unwrap().into_record().expect("should match");
        assert_eq!(rec.plate_name, "P2345678_0001");
        assert_eq!(rec.plate_name.chars().count(), 13);
        assert_eq!(rec.well_position, "G02");
        assert_eq!(rec.z_value, 8267, "Z must be truncated, not rounded");
        assert_eq!(rec.file_name, GOOD);
    }

    #[test]
    fn test_missing_gate_substring_skips() {
        let name = GOOD.replace("_GFP-ref", "_RFP-ref");
        assert_eq!(
            well(&name).unwrap(),
            Extraction::Skipped(SkipReason::MissingSubstring)
        );
    }

    #[test]
    fn test_missing_well_skips_even_with_gate() {
        let name = GOOD.replace("_165dot", "_166dot");
        assert_eq!(
            well(&name).unwrap(),
            Extraction::Skipped(SkipReason::NoWellMatch)
        );
    }

    #[test]
    fn test_missing_z_skips() {
        // Gate substring present but no "_Z<digits>" directly before it.
        let name = "P2345678_0001_A_G02_165dot5_GFP-ref.tif";
        assert_eq!(
            well(name).unwrap(),
            Extraction::Skipped(SkipReason::NoZMatch)
        );
    }

    #[test]
    fn test_malformed_z_is_fatal() {
        let name = "P2345678_0001_A_G02_165dot5_Z82.67.1_GFP-ref.tif";
        assert!(matches!(
            well(name).unwrap_err(),
            ExtractError::InvalidZValue { .. }
        ));
    }

    #[test]
    fn test_integer_z_without_fraction_accepted_by_well() {
        let name = "P2345678_0001_A_G02_165dot5_Z8578_GFP-ref.tif";
        assert_eq!(well(name).unwrap().into_record().unwrap().z_value, 8578);
    }

    #[test]
    fn test_span_sensitivity() {
        let base = well(GOOD).unwrap().into_record().unwrap();

        // Outside all marked spans: nothing changes ('A' between plate and well).
        let outside = GOOD.replacen("_A_", "_B_", 1);
        let rec = well(&outside).unwrap().into_record().unwrap();
        assert_eq!(
            (&rec.plate_name, &rec.well_position, rec.z_value),
            (&base.plate_name, &base.well_position, base.z_value)
        );

        // Inside the plate span: only the plate changes.
        let plate_changed = GOOD.replacen("P2345678", "P2945678", 1);
        let rec = well(&plate_changed).unwrap().into_record().unwrap();
        assert_ne!(rec.plate_name, base.plate_name);
        assert_eq!(rec.well_position, base.well_position);
        assert_eq!(rec.z_value, base.z_value);

        // Inside the well span: only the well changes.
        let well_changed = GOOD.replacen("G02", "H11", 1);
        let rec = well(&well_changed).unwrap().into_record().unwrap();
        assert_eq!(rec.plate_name, base.plate_name);
        assert_eq!(rec.well_position, "H11");
        assert_eq!(rec.z_value, base.z_value);

        // Inside the Z span: only Z changes.
        let z_changed = GOOD.replacen("8267.99", "8301.50", 1);
        let rec = well(&z_changed).unwrap().into_record().unwrap();
        assert_eq!(rec.plate_name, base.plate_name);
        assert_eq!(rec.well_position, base.well_position);
        assert_eq!(rec.z_value, 8301);
    }

    #[test]
    fn test_char_prefix_is_char_based() {
        assert_eq!(char_prefix("ééééé", 3), Some("ééé"));
        assert_eq!(char_prefix("abc", 3), Some("abc"));
        assert_eq!(char_prefix("ab", 3), None);
    }

    #[test]
    fn test_truncate_toward_zero() {
        let p = Path::new("x");
        assert_eq!(truncate_z(8267.999, p).unwrap(), 8267);
        assert_eq!(truncate_z(-2.7, p).unwrap(), -2);
        assert!(truncate_z(f64::INFINITY, p).is_err());
        assert!(truncate_z(1e300, p).is_err());
    }

    #[test]
    fn test_subfolder_record() {
        let rec = subfolder("P1_A01-A_Z8267.25_GFP-ref.tif", "/run/Plate07_rig1/site3")
            .unwrap()
            .into_record()
            .expect("should match");
        assert_eq!(rec.subfolder_tag, "Plate07");
        assert!((rec.z_value - 8267.25).abs() < 1e-9, "Z kept as float");
    }

    #[test]
    fn test_subfolder_requires_fraction_and_tif() {
        assert_eq!(
            subfolder("P1_Z8267_GFP-ref.tif", "/run/a").unwrap(),
            Extraction::Skipped(SkipReason::NoZMatch)
        );
        assert_eq!(
            subfolder("P1_Z8267.5_GFP-ref.png", "/run/a").unwrap(),
            Extraction::Skipped(SkipReason::NoZMatch)
        );
    }

    #[test]
    fn test_subfolder_tag_rules() {
        let root = Path::new("/run");
        assert_eq!(subfolder_tag(Path::new("/run"), root), ".");
        assert_eq!(subfolder_tag(Path::new("/run/doNotAnalyze_old"), root), "doNotAnalyze");
        assert_eq!(subfolder_tag(Path::new("/run/Plate3/deeper_x"), root), "Plate3");
        assert_eq!(subfolder_tag(Path::new("/run/_lead"), root), "");
    }
}
