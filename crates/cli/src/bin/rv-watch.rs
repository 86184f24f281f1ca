use clap::Parser;
use rvwatch::{Error, cli::WatchCli, trace};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
};
use tracing::{debug, info};
use watcher::{WatchMonitor, host::StoreObserver};

fn main() -> anyhow::Result<()> {
    let cli = WatchCli::parse();
    cli.common.init_tracing();

    debug!(config = ?cli);

    let mut config = cli.common.config()?;
    config.artifact.path = cli.artifact.clone();

    let (monitor, hits) = WatchMonitor::new(&config);
    monitor.install();

    let reader: Box<dyn BufRead> = match &cli.trace {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(Error::TraceRead)?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut out = io::stdout().lock();
    let count = trace::replay(reader, 0, |access| {
        monitor.observe(&access);
        for hit in hits.try_iter() {
            writeln!(out, "vcpu {} wrote {:#x}", hit.vcpu, hit.address).map_err(Error::Output)?;
        }
        Ok(())
    })?;
    info!(count, "trace replayed");

    Ok(())
}
