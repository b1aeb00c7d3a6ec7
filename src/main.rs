use clap::{Args, Parser, Subcommand};
use colored::*;
use core::error::Error;

use mdwrap_lib::config as mdwrap_config;
use mdwrap_lib::exit_codes::exit;

use mdwrap_config::{ConfigSource, SourcedConfig, normalize_key};

mod file_processor;

use file_processor::Mode;

const DEFAULT_CONFIG_FILE: &str = ".mdwrap.toml";

#[derive(Parser)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Control colored output: auto, always, never
    #[arg(long, global = true, default_value = "auto", value_parser = ["auto", "always", "never"], help = "Control colored output: auto, always, never")]
    color: String,

    /// Path to configuration file
    #[arg(long, global = true, help = "Path to configuration file")]
    config: Option<String>,

    /// Ignore all configuration files and use built-in defaults
    #[arg(
        long,
        global = true,
        help = "Ignore all configuration files and use built-in defaults"
    )]
    no_config: bool,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap long lines of Markdown files in place
    Wrap(WrapArgs),
    /// Report lines that would be wrapped, without changing anything
    Check(WrapArgs),
    /// Create a default configuration file
    Init {
        /// Path of the file to create
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        output: String,
    },
    /// Show the effective configuration or query a single key
    Config {
        #[command(subcommand)]
        subcmd: Option<ConfigSubcommand>,
        /// Output format (toml or json)
        #[arg(long, default_value = "toml", value_parser = ["toml", "json"])]
        output: String,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Query a specific config key (e.g. global.rulers)
    Get { key: String },
    /// Show the path of the config file in use
    File,
}

/// Inclusive 1-based line range given on the command line, stored zero-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub first: usize,
    pub last: usize,
}

fn parse_line_range(s: &str) -> Result<LineRange, String> {
    let parse = |part: &str| -> Result<usize, String> {
        match part.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("'{part}' is not a line number (lines start at 1)")),
        }
    };
    let (first, last) = match s.split_once(':') {
        Some((first, last)) => (parse(first)?, parse(last)?),
        None => {
            let line = parse(s)?;
            (line, line)
        }
    };
    if first > last {
        return Err(format!("range {s} ends before it starts"));
    }
    Ok(LineRange { first, last })
}

fn parse_wrap_column(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{s}' is not a positive integer")),
    }
}

#[derive(Args, Debug)]
pub struct WrapArgs {
    /// Files or directories to process (use '-' for stdin)
    #[arg(required = false)]
    paths: Vec<String>,

    /// Only wrap lines A through B (1-based, inclusive), e.g. 3:5
    #[arg(long, value_name = "A:B", value_parser = parse_line_range)]
    pub lines: Option<LineRange>,

    /// Wrap column, overriding the configuration
    #[arg(long, value_parser = parse_wrap_column)]
    pub wrap_column: Option<usize>,

    /// Show a diff of what would change instead of writing files
    #[arg(long, help = "Show diff of what would be wrapped instead of writing files")]
    pub diff: bool,

    /// Include matching files (comma-separated glob patterns)
    #[arg(long)]
    pub include: Option<String>,

    /// Exclude matching files (comma-separated glob patterns)
    #[arg(long)]
    pub exclude: Option<String>,

    /// Do not respect .gitignore files when scanning directories
    #[arg(long)]
    pub no_respect_gitignore: bool,

    /// Quiet mode
    #[arg(short, long, help = "Print findings and errors, but nothing else")]
    pub quiet: bool,
}

fn load_config_with_cli_error_handling(cli: &Cli, overrides: Option<&mdwrap_config::CliOverrides>) -> SourcedConfig {
    match SourcedConfig::load_with_discovery(cli.config.as_deref(), overrides, cli.no_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red().bold(), e);
            exit::tool_error();
        }
    }
}

fn split_list(patterns: &str) -> Vec<String> {
    patterns
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn print_config_warnings(sourced: &SourcedConfig) {
    for warning in mdwrap_config::validate_config_sourced(sourced) {
        eprintln!("{} {}", "[config warning]".yellow().bold(), warning.message);
    }
}

fn run_wrap(cli: &Cli, args: &WrapArgs, mode: Mode) {
    let overrides = mdwrap_config::CliOverrides {
        wrap_column: args.wrap_column,
        include: args.include.as_deref().map(split_list),
        exclude: args.exclude.as_deref().map(split_list),
        respect_gitignore: args.no_respect_gitignore.then_some(false),
    };
    let sourced = load_config_with_cli_error_handling(cli, Some(&overrides));
    if !args.quiet {
        print_config_warnings(&sourced);
    }
    let project_root = sourced.project_root.clone();
    let config: mdwrap_config::Config = sourced.into();

    if args.paths.iter().any(|p| p == "-") {
        if args.paths.len() > 1 {
            eprintln!("{}: '-' cannot be combined with other paths", "Error".red().bold());
            exit::tool_error();
        }
        match file_processor::process_stdin(&config, args, mode) {
            Ok(outcome) => {
                print!("{}", outcome.output);
                if mode == Mode::Check && !outcome.changed_lines.is_empty() {
                    exit::violations_found();
                }
                exit::success();
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                exit::tool_error();
            }
        }
    }

    let file_paths = match file_processor::find_markdown_files(&args.paths, args, &config, project_root.as_deref()) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            exit::tool_error();
        }
    };

    if file_paths.is_empty() {
        if !args.quiet {
            println!("No markdown files found to process.");
        }
        exit::success();
    }

    let results = file_processor::process_files(&file_paths, &config, args, mode);

    let mut had_errors = false;
    let mut files_changed = 0;
    let mut lines_changed = 0;
    for result in results {
        match result {
            Ok(outcome) => {
                log::debug!("{}: {} line(s) to wrap", outcome.path, outcome.changed_lines.len());
                print!("{}", outcome.output);
                if !outcome.changed_lines.is_empty() {
                    files_changed += 1;
                    lines_changed += outcome.changed_lines.len();
                }
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                had_errors = true;
            }
        }
    }

    if !args.quiet && !had_errors {
        let file_count = file_paths.len();
        let summary = match mode {
            _ if lines_changed == 0 => format!("All lines fit in {file_count} file(s)").green().bold(),
            Mode::Check => format!("Found {lines_changed} line(s) to wrap in {files_changed} of {file_count} file(s)")
                .yellow()
                .bold(),
            Mode::Wrap if args.diff => {
                format!("Would wrap {lines_changed} line(s) in {files_changed} of {file_count} file(s)")
                    .yellow()
                    .bold()
            }
            Mode::Wrap => format!("Wrapped {lines_changed} line(s) in {files_changed} of {file_count} file(s)")
                .green()
                .bold(),
        };
        println!("{summary}");
    }

    if had_errors {
        exit::tool_error();
    }
    if mode == Mode::Check && lines_changed > 0 {
        exit::violations_found();
    }
}

/// Effective value, provenance and file of each [global] key
fn global_entries(sourced: &SourcedConfig) -> Vec<(&'static str, toml::Value, ConfigSource, Option<String>)> {
    fn strings(values: &[String]) -> toml::Value {
        toml::Value::Array(values.iter().cloned().map(toml::Value::String).collect())
    }
    let g = &sourced.global;
    let mut entries = vec![(
        "rulers",
        toml::Value::Array(
            g.rulers
                .value
                .iter()
                .map(|r| toml::Value::Integer(*r as i64))
                .collect(),
        ),
        g.rulers.source,
        g.rulers.file().map(str::to_string),
    )];
    if let Some(column) = g.wrap_column.value {
        entries.push((
            "wrap-column",
            toml::Value::Integer(column as i64),
            g.wrap_column.source,
            g.wrap_column.file().map(str::to_string),
        ));
    }
    entries.extend([
        (
            "include",
            strings(&g.include.value),
            g.include.source,
            g.include.file().map(str::to_string),
        ),
        (
            "exclude",
            strings(&g.exclude.value),
            g.exclude.source,
            g.exclude.file().map(str::to_string),
        ),
        (
            "respect-gitignore",
            toml::Value::Boolean(g.respect_gitignore.value),
            g.respect_gitignore.source,
            g.respect_gitignore.file().map(str::to_string),
        ),
        (
            "inline-directives",
            toml::Value::Boolean(g.inline_directives.value),
            g.inline_directives.source,
            g.inline_directives.file().map(str::to_string),
        ),
    ]);
    entries
}

fn provenance(source: ConfigSource, file: Option<&str>) -> String {
    match file {
        Some(file) => format!("[from {source}: {file}]"),
        None => format!("[from {source}]"),
    }
}

fn handle_config_command(cli: &Cli, subcmd: Option<&ConfigSubcommand>, output: &str) {
    let sourced = load_config_with_cli_error_handling(cli, None);

    match subcmd {
        Some(ConfigSubcommand::Get { key }) => {
            let field = key
                .strip_prefix("global.")
                .or_else(|| key.strip_prefix("GLOBAL."))
                .unwrap_or(key);
            let field = normalize_key(field);
            match global_entries(&sourced).into_iter().find(|(name, ..)| *name == field) {
                Some((name, value, source, file)) => {
                    println!("global.{name} = {value} {}", provenance(source, file.as_deref()).dimmed());
                }
                None => {
                    eprintln!("{}: Unknown config key: {key}", "Error".red().bold());
                    exit::tool_error();
                }
            }
        }
        Some(ConfigSubcommand::File) => {
            if sourced.loaded_files.is_empty() {
                println!("No configuration file loaded (using defaults)");
            }
            for file in &sourced.loaded_files {
                println!("{file}");
            }
        }
        None if output == "json" => {
            let config: mdwrap_config::Config = sourced.into();
            match serde_json::to_string_pretty(&config) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("{}: Failed to serialize config: {e}", "Error".red().bold());
                    exit::tool_error();
                }
            }
        }
        None => {
            print_config_warnings(&sourced);
            println!("{}", "[global]".bold());
            for (name, value, source, file) in global_entries(&sourced) {
                println!("{name} = {value} {}", provenance(source, file.as_deref()).dimmed());
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    // Reset SIGPIPE so piping output into `head` does not panic
    #[cfg(unix)]
    {
        // SAFETY: restoring the default SIGPIPE handler before any output is written
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.color.as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::unset_override(),
    }

    match &cli.command {
        Commands::Wrap(args) => run_wrap(&cli, args, Mode::Wrap),
        Commands::Check(args) => run_wrap(&cli, args, Mode::Check),
        Commands::Init { output } => match mdwrap_config::create_default_config(output) {
            Ok(()) => {
                println!("Created default configuration file: {output}");
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                exit::tool_error();
            }
        },
        Commands::Config { subcmd, output } => handle_config_command(&cli, subcmd.as_ref(), output),
        Commands::Version => {
            println!("mdwrap {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_range() {
        assert_eq!(parse_line_range("3:5"), Ok(LineRange { first: 2, last: 4 }));
        assert_eq!(parse_line_range("7"), Ok(LineRange { first: 6, last: 6 }));
        assert!(parse_line_range("0:2").is_err());
        assert!(parse_line_range("5:3").is_err());
        assert!(parse_line_range("a:b").is_err());
    }

    #[test]
    fn test_parse_wrap_column() {
        assert_eq!(parse_wrap_column("80"), Ok(80));
        assert!(parse_wrap_column("0").is_err());
        assert!(parse_wrap_column("-1").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["mdwrap", "wrap", "--lines", "2:3", "--wrap-column", "60", "README.md"]).unwrap();
        match cli.command {
            Commands::Wrap(args) => {
                assert_eq!(args.lines, Some(LineRange { first: 1, last: 2 }));
                assert_eq!(args.wrap_column, Some(60));
                assert_eq!(args.paths, vec!["README.md"]);
            }
            _ => panic!("expected wrap command"),
        }
    }
}
