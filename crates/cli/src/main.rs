mod check;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use vero_core::folding::FoldingRange;
use vero_core::outline::OutlineItem;
use vero_core::{ParseError, SymbolRegistry};
use vero_lsp::config::{self, VeroConfig};
use vero_lsp::workspace;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Vero test-script language toolchain.
#[derive(Parser)]
#[command(name = "vero", version, about = "Vero test-script language toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a vero.toml (default: ./vero.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse scripts and report syntax errors
    Check {
        /// Script files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Parse a script and print its syntax tree as JSON
    Parse {
        /// Path to the .vero source file
        file: PathBuf,
    },

    /// Print the feature/page/scenario outline of a script
    Outline {
        /// Path to the .vero source file
        file: PathBuf,
    },

    /// Index a directory and list its pages, fields, actions and features
    Symbols {
        /// Workspace directory
        dir: PathBuf,
    },

    /// Print the foldable regions of a script
    Folds {
        /// Path to the .vero source file
        file: PathBuf,
    },

    /// Start the Language Server Protocol server (communicates over stdio)
    Lsp,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_deref(), cli.output, cli.quiet);

    match cli.command {
        Commands::Check { paths } => cmd_check(&paths, &config, cli.output, cli.quiet),
        Commands::Parse { file } => cmd_parse(&file, &config, cli.output, cli.quiet),
        Commands::Outline { file } => cmd_outline(&file, cli.output, cli.quiet),
        Commands::Symbols { dir } => cmd_symbols(&dir, &config, cli.output, cli.quiet),
        Commands::Folds { file } => cmd_folds(&file, cli.output, cli.quiet),
        Commands::Lsp => {
            if let Err(e) = vero_lsp::run() {
                eprintln!("LSP server error: {}", e);
                process::exit(1);
            }
        }
    }
}

/// Logs go to stderr so they never mix with command output or the LSP
/// stream. Filtered by `RUST_LOG`, warnings only by default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn load_config(explicit: Option<&Path>, output: OutputFormat, quiet: bool) -> VeroConfig {
    let result = match explicit {
        Some(path) => config::load(path),
        None => match std::env::current_dir() {
            Ok(cwd) => config::discover(&cwd),
            Err(_) => Ok(VeroConfig::default()),
        },
    };
    result.unwrap_or_else(|e| {
        report_error(&e.to_string(), output, quiet);
        process::exit(1);
    })
}

fn cmd_check(paths: &[PathBuf], config: &VeroConfig, output: OutputFormat, quiet: bool) {
    let report = match check::check_paths(paths, config) {
        Ok(r) => r,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            let text = check::format_text(&report);
            if report.is_clean() {
                if !quiet {
                    println!("{}", text);
                }
            } else {
                eprintln!("{}", text);
            }
        }
    }
    if !report.is_clean() {
        process::exit(1);
    }
}

fn cmd_parse(file: &Path, config: &VeroConfig, output: OutputFormat, quiet: bool) {
    let text = read_or_exit(file, output, quiet);
    let result = vero_core::parser::parse_source_with_options(&text, config.parse_options());
    print_json(&result.program);
    if !result.errors.is_empty() {
        report_parse_errors(file, &result.errors, output, quiet);
        process::exit(1);
    }
}

fn cmd_outline(file: &Path, output: OutputFormat, quiet: bool) {
    let text = read_or_exit(file, output, quiet);
    let items = vero_core::outline(&text);
    match output {
        OutputFormat::Json => print_json(&items),
        OutputFormat::Text => {
            for item in &items {
                print_outline_item(item, 0);
            }
        }
    }
}

fn print_outline_item(item: &OutlineItem, depth: usize) {
    let tags: String = item.tags.iter().map(|t| format!(" @{}", t)).collect();
    println!(
        "{}{} {}{}  {}:{}",
        "  ".repeat(depth),
        item.kind.as_str(),
        item.name,
        tags,
        item.line,
        item.column
    );
    for child in &item.children {
        print_outline_item(child, depth + 1);
    }
}

/// Registry contents as printed by `vero symbols --output json`.
#[derive(Serialize)]
struct SymbolsDump<'a> {
    pages: Vec<&'a vero_core::registry::PageDefinition>,
    features: Vec<&'a vero_core::registry::FeatureDefinition>,
}

fn cmd_symbols(dir: &Path, config: &VeroConfig, output: OutputFormat, quiet: bool) {
    let files = match workspace::find_script_files(dir, config) {
        Ok(f) => f,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    let mut registry = SymbolRegistry::new();
    for path in &files {
        match workspace::read_script(path) {
            Ok(text) => registry.index_file(&path.to_string_lossy(), &text),
            Err(e) => tracing::warn!(error = %e, "skipping file"),
        }
    }

    match output {
        OutputFormat::Json => print_json(&SymbolsDump {
            pages: registry.pages(),
            features: registry.features(),
        }),
        OutputFormat::Text => print_symbols(&registry),
    }
}

fn print_symbols(registry: &SymbolRegistry) {
    let at = |file: &Option<String>, line: u32| match file {
        Some(f) => format!("{}:{}", f, line),
        None => "(unresolved)".to_owned(),
    };
    for page in registry.pages() {
        println!("page {}  {}", page.name, at(&page.file_path, page.line.unwrap_or(0)));
        let (fields, actions) = registry.members_of(&page.name);
        for f in fields {
            println!("  field {} = {}", f.name, f.selector);
        }
        for a in actions {
            println!("  action {}", a.signature());
        }
    }
    for feature in registry.features() {
        println!("feature {}  {}", feature.name, at(&feature.file_path, feature.line));
        for s in &feature.scenarios {
            println!("  scenario {}", s);
        }
    }
}

fn cmd_folds(file: &Path, output: OutputFormat, quiet: bool) {
    let text = read_or_exit(file, output, quiet);
    let ranges = vero_core::folding_ranges(&text);
    match output {
        OutputFormat::Json => print_json(&ranges),
        OutputFormat::Text => {
            for r in &ranges {
                println!("{}", fold_line(r));
            }
        }
    }
}

fn fold_line(r: &FoldingRange) -> String {
    let kind = match r.block {
        Some(block) => format!("{} {}", r.kind.as_str(), block.as_str()),
        None => r.kind.as_str().to_owned(),
    };
    format!("{}-{} {}", r.start_line, r.end_line, kind)
}

fn read_or_exit(file: &Path, output: OutputFormat, quiet: bool) -> String {
    workspace::read_script(file).unwrap_or_else(|e| {
        report_error(&e.to_string(), output, quiet);
        process::exit(1);
    })
}

fn print_json<T: Serialize>(value: &T) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
    println!("{}", pretty);
}

fn report_parse_errors(file: &Path, errors: &[ParseError], output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = errors.iter().map(ParseError::to_json_value).collect();
            let err_json = serde_json::to_string_pretty(&serde_json::json!({ "errors": items }))
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                for e in errors {
                    eprintln!("{}:{}:{}: {}", file.display(), e.line, e.column, e.message);
                }
            }
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
