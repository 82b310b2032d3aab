use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use argscope_core::{ArgResolver, Result as ArgscopeResult};
use argscope_utils::{debug, init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard};
use clap::{Parser, Subcommand};

/// Resolve typed function arguments from DWARF debug info.
#[derive(Parser, Debug)]
#[command(name = "argscope")]
#[command(version)]
#[command(about = "Resolve typed function arguments from DWARF debug info", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (pretty or json); overrides ARGSCOPE_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Print "<type> <name>" for every parameter of a function
    Params
    {
        /// Binary carrying DWARF debug info
        binary: PathBuf,
        /// Function name as recorded in DW_AT_name
        function: String,
    },
    /// Print index, name and sized type for every parameter of a function
    Args
    {
        /// Binary carrying DWARF debug info
        binary: PathBuf,
        /// Function name as recorded in DW_AT_name
        function: String,
    },
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn setup_logging(cli: &Cli) -> Result<LoggingGuard, LoggingError>
{
    if cli.log_level.is_none() && cli.log_format.is_none() {
        return init_logging();
    }

    let level = match &cli.log_level {
        Some(level) => LogLevel::from_str(level).map_err(LoggingError::InvalidLevel)?,
        None => LogLevel::Warn,
    };
    let format = match &cli.log_format {
        Some(format) => LogFormat::from_str(format).map_err(LoggingError::InvalidFormat)?,
        None => LogFormat::Pretty,
    };
    init_logging_with_level(level, format)
}

fn run_command(command: Commands) -> ArgscopeResult<()>
{
    match command {
        Commands::Params { binary, function } => {
            debug!("Listing parameters of {} in {}", function, binary.display());
            let resolver = ArgResolver::open(&binary)?;
            for param in resolver.get_function_params(&function)? {
                println!("    {param}");
            }
            resolver.close();
            Ok(())
        }
        Commands::Args { binary, function } => {
            debug!("Resolving arguments of {} in {}", function, binary.display());
            let resolver = ArgResolver::open(&binary)?;
            let args = resolver.resolve_args(&function)?;
            for (name, ty) in args.in_declaration_order() {
                println!("{:>3} {name} {ty}", ty.funcarg_idx);
            }
            resolver.close();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_params_command()
    {
        let cli = Cli::try_parse_from(["argscope", "params", "/bin/true", "main"]).unwrap();
        match cli.command {
            Commands::Params { binary, function } => {
                assert_eq!(binary, PathBuf::from("/bin/true"));
                assert_eq!(function, "main");
            }
            Commands::Args { .. } => panic!("Expected params command"),
        }
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_parse_args_command_with_global_flags()
    {
        let cli = Cli::try_parse_from([
            "argscope",
            "args",
            "./target",
            "add",
            "--log-level",
            "debug",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Args { ref function, .. } if function == "add"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format.as_deref(), Some("json"));
    }

    #[test]
    fn test_missing_function_is_rejected()
    {
        assert!(Cli::try_parse_from(["argscope", "params", "/bin/true"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent()
    {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
