use crate::cli::SurveyArgs;
use crate::config::{Environment, build_config};
use crate::error::{CliError, Result};
use amberprep::engine::matcher::MatchOutcome;
use amberprep::engine::progress::ProgressReporter;
use amberprep::workflows::survey::{self, SurveyEntry, Verdict};
use tracing::info;

pub fn run(args: SurveyArgs) -> Result<()> {
    let env = Environment::from_process();
    let app = build_config(&args.input, None, &env)?;

    info!("Invoking the survey workflow...");
    let report = survey::run(&app.core_config, &ProgressReporter::new())?;

    for entry in &report.entries {
        println!("{}", describe(entry));
    }
    if !report.libraries.is_empty() {
        println!("Libraries that would be loaded:");
        for library in report.libraries.iter() {
            println!("  {}", library.display());
        }
    }

    let blocked = report
        .entries
        .iter()
        .filter(|e| !e.verdict.is_preparable())
        .count();
    if blocked > 0 {
        return Err(CliError::NotPreparable { count: blocked });
    }
    println!("✓ All structures can be prepared.");
    Ok(())
}

fn describe(entry: &SurveyEntry) -> String {
    let mut lines = vec![format!(
        "{}{}",
        entry.input.display(),
        if entry.is_protein { " (protein)" } else { "" }
    )];
    if !entry.nonstandard.is_empty() {
        let names: Vec<&str> = entry.nonstandard.iter().map(String::as_str).collect();
        lines.push(format!("  non-standard residues: {}", names.join(" ")));
    }
    for record in &entry.matches {
        let outcome = match &record.outcome {
            MatchOutcome::NoMatch => continue,
            MatchOutcome::AtomMismatch { .. } => "atom names differ, ignored",
            MatchOutcome::Unverified { .. } => "no atom names to verify, ignored",
            MatchOutcome::SkippedRedefinition { .. } => "units already defined, skipped",
            MatchOutcome::Accepted {
                redefinition: true, ..
            } => "accepted, redefines units",
            MatchOutcome::Accepted { .. } => "accepted",
        };
        lines.push(format!("  {}: {}", record.library.display(), outcome));
    }
    lines.push(match &entry.verdict {
        Verdict::Ready => "  ready".to_string(),
        Verdict::NeedsDerivation { unit } => {
            format!("  parameters for {} would be derived with antechamber", unit)
        }
        Verdict::UnresolvedProteinUnits { units } => format!(
            "  protein residues without parameters: {}",
            units.join(" ")
        ),
        Verdict::MultipleLigands { units } => format!(
            "  more than one unparameterized unit: {}; provide libraries or split the structure",
            units.join(" ")
        ),
        Verdict::NeedsConversion => "  not a PDB file; it is inspected after conversion".to_string(),
    });
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use amberprep::engine::matcher::MatchRecord;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    #[test]
    fn description_lists_residues_matches_and_verdict() {
        let units: BTreeSet<String> = ["LIG".to_string()].into();
        let entry = SurveyEntry {
            input: PathBuf::from("lig.pdb"),
            is_protein: false,
            nonstandard: units.clone(),
            matches: vec![
                MatchRecord {
                    library: PathBuf::from("old.lib"),
                    outcome: MatchOutcome::AtomMismatch {
                        units: units.clone(),
                    },
                },
                MatchRecord {
                    library: PathBuf::from("other.lib"),
                    outcome: MatchOutcome::NoMatch,
                },
            ],
            orphaned: units,
            verdict: Verdict::NeedsDerivation { unit: "LIG".into() },
        };

        let text = describe(&entry);

        assert_eq!(
            text,
            "lig.pdb\n  non-standard residues: LIG\n  old.lib: atom names differ, ignored\n  parameters for LIG would be derived with antechamber"
        );
    }
}
