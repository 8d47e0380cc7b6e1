use anyhow::Result;
use clap::Parser;
use sidepane::cli::{self, Cli, Commands};
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Reading the previous log has to happen before the bridge truncates it.
    if matches!(cli.command, Commands::Log) {
        return cli::print_log_file();
    }

    // Routes all log::info!() etc. to /tmp/sidepane_debug.log (and stderr when
    // RUST_LOG is set). The config's level is applied once it is loaded.
    sidepane::debug::init_log_bridge(cli.log_level);
    log::info!("Starting sidepane {}", sidepane::VERSION);

    // Host calls are async; events are still handled one at a time.
    let runtime = Runtime::new()?;
    let code = runtime.block_on(cli::run(cli))?;
    log::logger().flush();

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
