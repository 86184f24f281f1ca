use clap::{Args, Parser};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use config::Config;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use symbols::{SymbolSource, TriggerExpression};
use tracing_log::AsTrace;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Options shared by every binary.
#[derive(Debug, Args, Clone)]
pub struct Common {
    /// Path to configuration file.
    ///
    /// Without one, defaults apply, overridden by `RVWATCH_` environment
    /// variables.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

impl Common {
    pub fn config(&self) -> Result<Config, config::Error> {
        match &self.conffile {
            Some(path) => Config::load(path),
            None => Config::from_env(),
        }
    }

    /// Log to stderr at the requested verbosity. `RUST_LOG` directives take
    /// precedence.
    pub fn init_tracing(&self) {
        let level: LevelFilter = self.verbosity.log_level_filter().as_trace();
        let filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    }
}

/// Launch a program and publish the runtime addresses of its watched
/// variables.
///
/// The program is started stopped at its first instruction. The variables
/// named by the symbol source are resolved in its symbol table, their runtime
/// addresses are written to the watchlist, and the program is then resumed
/// and waited for.
#[derive(Debug, Parser, Clone)]
#[command(name = "rv-launch", about, long_about, version)]
pub struct LaunchCli {
    #[command(flatten)]
    pub common: Common,

    /// Watchlist file to publish. Overrides the configuration.
    #[arg(short, long)]
    pub artifact: Option<PathBuf>,

    /// Treat SYMBOL_SOURCE as a trigger expression even if such a file exists.
    #[arg(long, conflicts_with = "var_list")]
    pub trigger: bool,

    /// Treat SYMBOL_SOURCE as a variable-list file.
    #[arg(long)]
    pub var_list: bool,

    /// Executable to launch.
    pub program: PathBuf,

    /// Variable-list file, or a trigger expression over the watched
    /// variables.
    pub symbol_source: String,

    /// Arguments passed to the program.
    #[arg(last = true)]
    pub args: Vec<OsString>,
}

impl LaunchCli {
    pub fn symbol_source(&self) -> SymbolSource {
        if self.trigger {
            SymbolSource::Trigger(TriggerExpression::new(self.symbol_source.as_str()))
        } else if self.var_list {
            SymbolSource::VarList(PathBuf::from(&self.symbol_source))
        } else {
            SymbolSource::detect(&self.symbol_source)
        }
    }
}

/// Resolve the variables of a trigger expression in an executable and print
/// their symbol table entries.
#[derive(Debug, Parser, Clone)]
#[command(name = "rv-symbols", about, version)]
pub struct SymbolsCli {
    #[command(flatten)]
    pub common: Common,

    /// Executable to read.
    #[arg(value_parser = validate_file)]
    pub elf_file: PathBuf,

    /// Trigger expression naming the variables.
    pub trigger: String,
}

/// Replay a store trace against a watchlist and print every watched store.
///
/// Each trace line holds a hexadecimal address, optionally preceded by `r`
/// (load) or `w` (store). Lines without a prefix are stores.
#[derive(Debug, Parser, Clone)]
#[command(name = "rv-watch", about, long_about, version)]
pub struct WatchCli {
    #[command(flatten)]
    pub common: Common,

    /// Watchlist file to monitor.
    pub artifact: PathBuf,

    /// Trace file. Standard input when absent.
    #[arg(value_parser = validate_file)]
    pub trace: Option<PathBuf>,
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn commands_are_well_formed() {
        LaunchCli::command().debug_assert();
        SymbolsCli::command().debug_assert();
        WatchCli::command().debug_assert();
    }

    #[test]
    fn program_arguments_follow_double_dash() {
        let cli = LaunchCli::parse_from(["rv-launch", "/bin/prog", "x && y", "--", "-n", "3"]);
        assert_eq!(cli.program, PathBuf::from("/bin/prog"));
        assert_eq!(cli.args, [OsString::from("-n"), OsString::from("3")]);
        assert_eq!(
            cli.symbol_source(),
            SymbolSource::Trigger(TriggerExpression::new("x && y"))
        );
    }

    #[test]
    fn existing_file_is_a_var_list() {
        let list = tempfile::NamedTempFile::new().unwrap();
        let source = list.path().to_str().unwrap();

        let cli = LaunchCli::parse_from(["rv-launch", "/bin/prog", source]);
        assert_eq!(
            cli.symbol_source(),
            SymbolSource::VarList(list.path().to_owned())
        );

        let forced = LaunchCli::parse_from(["rv-launch", "--trigger", "/bin/prog", source]);
        assert!(matches!(forced.symbol_source(), SymbolSource::Trigger(_)));
    }

    #[test]
    fn trigger_and_var_list_conflict() {
        let parsed =
            LaunchCli::try_parse_from(["rv-launch", "--trigger", "--var-list", "/bin/prog", "x"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_config_file_is_rejected() {
        let elf = env!("CARGO_MANIFEST_DIR");
        assert!(SymbolsCli::try_parse_from(["rv-symbols", elf, "x"]).is_ok());
        let parsed = SymbolsCli::try_parse_from(["rv-symbols", "-c", "/nonexistent.toml", elf, "x"]);
        assert!(parsed.is_err());
    }
}
