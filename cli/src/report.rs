//! # Reporting
//!
//! Human and JSON rendering of mutation outcomes.

use crate::error::CliResult;
use weld_core::MutationOutcome;

/// `  -> Updated src/repository/mod.rs`
pub fn status_line(outcome: &MutationOutcome) -> String {
    let verb = match (outcome.changed, outcome.written) {
        (true, true) => "Updated",
        (true, false) => "Would update",
        (false, _) => "Unchanged",
    };
    format!("  -> {} {}", verb, outcome.path.display())
}

/// Prints every outcome, as status lines or as one pretty JSON array.
pub fn print_outcomes(outcomes: &[MutationOutcome], json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcomes)?);
        return Ok(());
    }
    for outcome in outcomes {
        println!("{}", status_line(outcome));
        if let Some(backup) = &outcome.backup {
            println!("     (backup: {})", backup.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn outcome(changed: bool, written: bool) -> MutationOutcome {
        MutationOutcome {
            path: PathBuf::from("proto/api.proto"),
            changed,
            written,
            backup: None,
        }
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            status_line(&outcome(true, true)),
            "  -> Updated proto/api.proto"
        );
        assert_eq!(
            status_line(&outcome(true, false)),
            "  -> Would update proto/api.proto"
        );
        assert_eq!(
            status_line(&outcome(false, false)),
            "  -> Unchanged proto/api.proto"
        );
    }

    #[test]
    fn test_json_shape() {
        let mut o = outcome(true, true);
        o.backup = Some(PathBuf::from("proto/api.proto.bak"));
        let value = serde_json::to_value(&o).unwrap();
        assert_eq!(value["path"], "proto/api.proto");
        assert_eq!(value["changed"], true);
        assert_eq!(value["backup"], "proto/api.proto.bak");

        let value = serde_json::to_value(outcome(false, false)).unwrap();
        assert!(value.get("backup").is_none());
    }
}
