use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mergescore_cli::export::{self, Layout};
use mergescore_cli::render::{self, Palette};
use mergescore_core::analysis::ToolReports;
use mergescore_core::comparator;
use mergescore_core::config::{self, AppConfig};
use mergescore_core::pipeline;
use mergescore_core::report::RunReport;
use mergescore_core::runner::{discover_scenarios, run_all, RunnerRegistry};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref())?;
    let palette = Palette { color: !cli.no_color };

    match cli.command {
        Commands::Compare {
            merge,
            expected,
            output,
            extensions,
            json,
        } => {
            if !extensions.is_empty() {
                cfg.scan.extensions = extensions;
            }
            let report = pipeline::evaluate(&merge, &expected, &cfg)?;
            finish(&cfg, &report, output, Layout::Recursive, json, palette)
        }
        Commands::Legacy {
            merge,
            expected,
            output,
            json,
        } => {
            let report = pipeline::evaluate_legacy(&merge, &expected, &cfg)?;
            finish(&cfg, &report, output, Layout::Legacy, json, palette)
        }
        Commands::Files {
            merge,
            expected,
            diff,
            json,
        } => run_files(&merge, &expected, diff, json, palette),
        Commands::Analyze { reports, tool } => run_analyze(&cfg, &reports, tool.as_deref(), palette),
        Commands::RunTool {
            tool,
            scenarios,
            output,
        } => run_tool(&cfg, &tool, &scenarios, &output),
    }
}

#[derive(Parser)]
#[command(name = "mergescore")]
#[command(about = "Scores merge-tool output against expected results", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Disable coloured output
    #[arg(long, default_value_t = false)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a merge output tree against the expected tree
    Compare {
        /// Directory produced by the merge tool
        #[arg(long)]
        merge: PathBuf,
        /// Directory holding the expected files
        #[arg(long)]
        expected: PathBuf,
        /// Write the report directory here (overrides report.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// File extensions to include (comma-separated)
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        extensions: Vec<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare scenario folders by identical file names only
    Legacy {
        #[arg(long)]
        merge: PathBuf,
        #[arg(long)]
        expected: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Compare a single pair of files
    Files {
        #[arg(long)]
        merge: PathBuf,
        #[arg(long)]
        expected: PathBuf,
        /// Print the unified diff
        #[arg(long, default_value_t = false)]
        diff: bool,
        #[arg(long)]
        json: bool,
    },
    /// Tabulate one or more saved JSON reports
    Analyze {
        /// Report files (full_recursive_report.json)
        #[arg(required = true)]
        reports: Vec<PathBuf>,
        /// Tool for the per-scenario tables; also names a single report
        #[arg(long)]
        tool: Option<String>,
    },
    /// Run a configured merge tool over every scenario folder
    RunTool {
        /// Tool name from the [[tools]] config
        #[arg(long)]
        tool: String,
        /// Directory of scenario folders with left/base/right trees
        #[arg(long)]
        scenarios: PathBuf,
        /// Output root; each scenario writes to <output>/<scenario>
        #[arg(long)]
        output: PathBuf,
    },
}

fn finish(
    cfg: &AppConfig,
    report: &RunReport,
    output: Option<PathBuf>,
    layout: Layout,
    json: bool,
    palette: Palette,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render::render_report(report, cfg.report.worst_limit, palette));
    }
    let output = output.or_else(|| cfg.report.output_dir.as_ref().map(PathBuf::from));
    if let Some(root) = output {
        let dir = export::write_report(&root, report, layout)?;
        if !json {
            println!("\n{}", palette.good(&format!("Report saved to {}", dir.display())));
        }
    }
    Ok(())
}

fn run_files(merge: &Path, expected: &Path, diff: bool, json: bool, palette: Palette) -> Result<()> {
    let (merge_lines, expected_lines) = comparator::load(merge, expected)?;
    let metrics = comparator::metrics(&merge_lines, &expected_lines);
    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!("{}", palette.header("=== FILE COMPARISON ==="));
        println!("Merge:    {}", merge.display());
        println!("Expected: {}", expected.display());
        print!("{}", render::render_metrics(&metrics, palette));
    }
    if diff {
        let text = comparator::diff_report(&expected_lines, &merge_lines);
        if text.is_empty() {
            println!("{}", palette.good("No differences"));
        } else {
            println!("{text}");
        }
    }
    Ok(())
}

fn run_analyze(cfg: &AppConfig, paths: &[PathBuf], tool: Option<&str>, palette: Palette) -> Result<()> {
    let mut reports = ToolReports::new(cfg.tools.iter().map(|t| t.name.clone()).collect());
    // An explicit name only makes sense for a single report.
    let name_for_load = if paths.len() == 1 { tool } else { None };
    for path in paths {
        reports.load(path, name_for_load)?;
    }
    print!("{}", render::render_analysis(&reports, tool, palette));
    Ok(())
}

fn run_tool(cfg: &AppConfig, tool: &str, scenarios: &Path, output: &Path) -> Result<()> {
    let registry = RunnerRegistry::from_config(&cfg.tools);
    let runner = registry.get(tool)?;
    let found = discover_scenarios(scenarios, output)
        .with_context(|| format!("listing scenarios in {}", scenarios.display()))?;
    if found.is_empty() {
        bail!("no scenario folders under {}", scenarios.display());
    }

    let outcome = run_all(runner.as_ref(), &found);
    println!(
        "{}: {} scenarios succeeded, {} failed",
        runner.name(),
        outcome.succeeded.len(),
        outcome.failed.len()
    );
    if !outcome.failed.is_empty() {
        bail!("{} failed on {}", runner.name(), outcome.failed.join(", "));
    }
    Ok(())
}
