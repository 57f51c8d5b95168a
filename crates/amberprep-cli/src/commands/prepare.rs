use crate::cli::PrepareArgs;
use crate::config::{Environment, build_config};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use crate::utils::review::interactive_review;
use amberprep::{
    engine::{
        progress::ProgressReporter,
        review::ReviewGate,
        stages::Stage,
        tools::{Collaborators, amber::AmberToolchain},
    },
    workflows::{self, prepare::PreparationResult},
};
use tracing::info;

pub fn run(args: PrepareArgs) -> Result<()> {
    let env = Environment::from_process();
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args.input, Some(&args.run), &env)?;
    let config = &app.core_config;

    std::fs::create_dir_all(&config.pipeline.work_dir)?;
    let toolchain = AmberToolchain::new(config.tools.clone(), &config.pipeline.work_dir);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let review = if app.interactive {
        ReviewGate::with_callback(interactive_review(progress_handler.clone()))
    } else {
        ReviewGate::always_proceed()
    };

    println!(
        "Starting preparation of {} structure(s)...",
        config.structures.len()
    );
    info!("Invoking the core preparation workflow...");
    let result = workflows::prepare::run(
        config,
        Collaborators::uniform(&toolchain),
        &review,
        &reporter,
    )?;

    print_summary(&result, config.pipeline.run_production);
    Ok(())
}

fn print_summary(result: &PreparationResult, run_production: bool) {
    for report in &result.structures {
        println!(
            "  {} -> {}",
            report.input.display(),
            report.prepared.display()
        );
        if let Some(derived) = &report.derived {
            println!(
                "    derived unit {} (net charge {:+}) -> {}",
                derived.unit,
                derived.net_charge,
                derived.library.library.display()
            );
        }
    }
    if !result.libraries.is_empty() {
        println!("  Libraries loaded:");
        for library in result.libraries.iter() {
            println!("    {}", library.display());
        }
    }

    println!("✓ Topology written to: {}", result.topology.display());
    println!("✓ Coordinates written to: {}", result.coordinates.display());

    if !result.stages_run.is_empty() {
        let stages: Vec<String> = result.stages_run.iter().map(Stage::to_string).collect();
        println!("✓ MD stages completed: {}", stages.join(", "));
    }
    if !run_production {
        if let Some(deck) = result
            .control_decks
            .iter()
            .find(|deck| deck.to_string_lossy().ends_with("_md3.in"))
        {
            println!(
                "  Production control deck written to {}; it was not run.",
                deck.display()
            );
        }
    }
}
