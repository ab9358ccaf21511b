//! workspace-monitor CLI entry point
//!
//! Plays the role of a workspace loader: enumerates the known files, hands
//! them to the monitoring service, and polls for a reload verdict. Each
//! reload restarts monitoring and re-reads the tree.

use std::path::Path;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use workspace_monitor::{
    collect_known_files, resolve_root, Cli, IgnoreFilter, MonitoringService, Result,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "workspace_monitor=debug"
    } else {
        "workspace_monitor=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // May fail if already initialized, which is fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;
    let root = resolve_root(&cli.root)?;
    let interval = config.poll_interval();
    let filter = IgnoreFilter::new(config.ignored_dirs.iter().cloned());
    let service = MonitoringService::new(config);

    tracing::info!(
        "Starting workspace-monitor v{} on {}",
        env!("CARGO_PKG_VERSION"),
        root.display()
    );

    let mut reloads = 0usize;
    loop {
        load_workspace(&service, &root, &filter)?;

        while !service.assess_if_reload_necessary() {
            thread::sleep(interval);
        }

        reloads += 1;
        tracing::info!(
            "Reload #{} required after {} observed changes",
            reloads,
            service.change_count()
        );
        if matches!(cli.max_reloads, Some(max) if reloads >= max) {
            break;
        }
    }

    service.stop_monitoring();
    Ok(())
}

/// Start a fresh session, then assign the known set it will reconcile against
fn load_workspace(service: &MonitoringService, root: &Path, filter: &IgnoreFilter) -> Result<()> {
    service.start_monitoring(root)?;
    let files = collect_known_files(root, filter)?;
    tracing::info!("Loaded {} known files", files.len());
    service.set_known_file_paths(&files)
}
