use clap::Parser;
use rvwatch::{Error, cli::SymbolsCli};
use std::io::{self, Write};
use symbols::{SymbolTable, TriggerExpression, resolve};
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let cli = SymbolsCli::parse();
    cli.common.init_tracing();

    debug!(config = ?cli);

    let table = SymbolTable::read(&cli.elf_file)?;
    let trigger = TriggerExpression::new(cli.trigger.as_str());
    let resolution = resolve(&table, trigger.required_symbols())?;

    let mut out = io::stdout().lock();
    writeln!(out, "{:<32} {:>18} {:>8} {:<8} SECTION", "NAME", "ADDRESS", "SIZE", "KIND")
        .map_err(Error::Output)?;
    for symbol in &resolution {
        writeln!(
            out,
            "{:<32} {:>#18x} {:>8} {:<8} {}",
            symbol.name, symbol.static_offset, symbol.size, symbol.kind, symbol.section
        )
        .map_err(Error::Output)?;
    }

    Ok(())
}
