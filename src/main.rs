//! Relay Latency Bench - Main CLI Application
//!
//! Ranks the relays of a VPN provider by ICMP round-trip time and writes the
//! ranking to a CSV file.

use relay_latency_bench::{
    app::{App, RunOutcome},
    cli::Cli,
    config::{display_config_summary, load_config, EnvManager},
    error::{AppError, Result},
    logging::Logger,
    PKG_NAME, VERSION,
};
use std::{error::Error, process};

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        eprintln!("Please report this issue with the command line you ran.");
        process::exit(1);
    }));

    // Parse command line arguments
    let cli = Cli::parse_args();
    let use_color = cli.use_colors();
    let debug = cli.debug;

    if let Err(e) = run_application(cli).await {
        eprintln!("Error: {}", e.format_for_console(use_color));

        if let Some(source) = e.source() {
            eprintln!("Caused by: {}", source);
        }

        // Print suggestions for common errors
        print_error_suggestions(&e);

        // the structured record repeats the message, keep it for debugging
        if debug {
            let mut logger = Logger::new("MAIN");
            logger.set_color(use_color);
            logger.error("Run aborted").error_info(&e).log();
        }

        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        println!("{} v{}", PKG_NAME, VERSION);
        if let Some(commit) = option_env!("GIT_COMMIT") {
            println!("Commit: {}", commit);
        }
        if let Some(built) = option_env!("BUILD_TIME") {
            println!("Built: {}", built);
        }
        if let Some(target) = option_env!("TARGET_TRIPLE") {
            println!("Target: {}", target);
        }
        println!("Debug mode enabled");
        println!();
    }

    let config = load_config(cli)?;
    colored::control::set_override(config.enable_color);

    if config.debug {
        println!("Configuration Summary:");
        println!("{}", display_config_summary(&config));
        println!();
    }

    let debug = config.debug;
    let app = App::new(config)?;
    let outcome = app.run().await?;

    if debug {
        match outcome {
            RunOutcome::Listed(countries) => println!("Listed {} countries", countries),
            RunOutcome::Declined => println!("Existing report kept"),
            RunOutcome::Written { path, relays } => {
                println!("Wrote {} rows to {}", relays, path.display())
            }
        }
    }

    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format");
            eprintln!("  - Timeouts take a unit, e.g. 500ms, 2s or 1m (at most 5m)");
            eprintln!("  - The relay API URL must start with http:// or https://");
            eprintln!();
            eprint!("{}", EnvManager::display_env_help());
        }
        AppError::Network(_) | AppError::HttpRequest(_) | AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check your internet connection");
            eprintln!("  - Verify the relay API is reachable from this machine");
            eprintln!("  - Check proxy and firewall settings");
        }
        AppError::Probe(_) => {
            eprintln!();
            eprintln!("ICMP troubleshooting:");
            eprintln!("  - Run as root, or grant the binary CAP_NET_RAW");
            eprintln!("    (sudo setcap cap_net_raw+ep $(which rlb))");
            eprintln!("  - On Linux, unprivileged ping sockets need your group in");
            eprintln!("    net.ipv4.ping_group_range");
        }
        AppError::Io(_) => {
            eprintln!();
            eprintln!("File troubleshooting:");
            eprintln!("  - Check that the output directory exists and is writable");
            eprintln!("  - Choose another location with --output");
        }
        _ => {}
    }
}
