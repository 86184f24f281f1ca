use clap::Parser;
use launcher::Launcher;
use rvwatch::cli::LaunchCli;
use tracing::{debug, warn};

fn main() -> anyhow::Result<()> {
    let cli = LaunchCli::parse();
    cli.common.init_tracing();

    debug!(config = ?cli);

    let mut config = cli.common.config()?;
    if let Some(path) = &cli.artifact {
        config.artifact.path = path.clone();
    }

    let required = cli.symbol_source().required_symbols()?;
    let report = Launcher::new(&config).run(&cli.program, &cli.args, &required)?;
    if !report.exit.success() {
        warn!(pid = %report.pid, exit = %report.exit, "target program did not succeed");
    }

    Ok(())
}
