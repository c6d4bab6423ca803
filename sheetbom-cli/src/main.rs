//! Sheetbom CLI - KiCad sheet hierarchy and bill of materials from the command line.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sheetbom::{DirectorySource, LoadOptions, Page, Project};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetbom")]
#[command(about = "KiCad sheet hierarchy and BOM tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Log loading progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List schematic pages in hierarchy order
    Pages {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Print the grouped bill of materials
    Bom {
        #[command(flatten)]
        project: ProjectArgs,

        /// Print one row per placed designator instead of grouped rows
        #[arg(long)]
        ungrouped: bool,
    },

    /// Look up labels or designators
    Find {
        #[command(flatten)]
        project: ProjectArgs,

        /// Net label text
        #[arg(long, conflicts_with_all = ["uuid", "designator"])]
        label: Option<String>,

        /// UUID of a label
        #[arg(long, conflicts_with = "designator")]
        uuid: Option<String>,

        /// Reference designator, e.g. R12
        #[arg(long)]
        designator: Option<String>,
    },

    /// Project overview: counts, pages and BOM
    Summary {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[derive(Args)]
struct ProjectArgs {
    /// Path to project directory
    #[arg(value_name = "DIR", default_value = ".")]
    dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Skip files that fail to parse instead of aborting
    #[arg(long)]
    lenient: bool,

    /// Number of files read and parsed at once
    #[arg(short, long, value_name = "N", default_value_t = 8)]
    jobs: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Pages { project } => handle_pages(&project).await,
        Commands::Bom { project, ungrouped } => handle_bom(&project, ungrouped).await,
        Commands::Find {
            project,
            label,
            uuid,
            designator,
        } => handle_find(&project, label, uuid, designator).await,
        Commands::Summary { project } => handle_summary(&project).await,
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sheetbom=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn load_project(args: &ProjectArgs) -> anyhow::Result<Project> {
    if !args.dir.is_dir() {
        anyhow::bail!("{} is not a directory", args.dir.display());
    }

    let options = if args.lenient {
        LoadOptions::lenient()
    } else {
        LoadOptions::default()
    }
    .with_concurrency(args.jobs);

    let source = DirectorySource::new(&args.dir);
    let project = Project::load(&source, &options)
        .await
        .with_context(|| format!("failed to load project in {}", args.dir.display()))?;

    if project.is_empty() {
        anyhow::bail!("no KiCad schematics or boards found in {}", args.dir.display());
    }
    debug!("Loaded {} documents", project.documents().len());
    Ok(project)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn handle_pages(args: &ProjectArgs) -> anyhow::Result<i32> {
    let project = load_project(args).await?;

    match args.format {
        OutputFormat::Human => output_pages_human(&project),
        OutputFormat::Json => print_json(&serde_json::json!({
            "hierarchy_resolved": project.hierarchy_resolved(),
            "pages": project.pages(),
        }))?,
    }
    Ok(0)
}

fn output_pages_human(project: &Project) {
    if project.pages().is_empty() {
        println!("No schematic pages");
        return;
    }
    if !project.hierarchy_resolved() {
        println!("No root sheet found; pages listed in load order\n");
    }

    for page in project.pages() {
        println!("{}", format_page(page));
    }
}

fn format_page(page: &Page) -> String {
    let number = if page.page_number.is_empty() {
        "-"
    } else {
        page.page_number.as_str()
    };
    format!("{:>4}  {:<24} {}", number, page.name, page.filename)
}

async fn handle_bom(args: &ProjectArgs, ungrouped: bool) -> anyhow::Result<i32> {
    let project = load_project(args).await?;

    match (args.format, ungrouped) {
        (OutputFormat::Json, false) => print_json(&project.bom_items())?,
        (OutputFormat::Json, true) => print_json(&project.raw_bom_items())?,
        (OutputFormat::Human, false) => {
            println!("BOM from {:?} ({} rows)", project.bom_source(), project.bom_items().len());
            println!("{}", "─".repeat(60));
            for row in project.bom_items() {
                let dnp = if row.dnp { "  DNP" } else { "" };
                println!(
                    "{:>3} x {:<16} {:<40}{}",
                    row.qty(),
                    row.name,
                    row.footprint,
                    dnp
                );
                println!("      {}", row.reference().replace(",\n", ", "));
            }
        }
        (OutputFormat::Human, true) => {
            for item in project.raw_bom_items() {
                println!("{:<8} {:<16} {}", item.reference, item.name, item.footprint);
            }
        }
    }
    Ok(0)
}

async fn handle_find(
    args: &ProjectArgs,
    label: Option<String>,
    uuid: Option<String>,
    designator: Option<String>,
) -> anyhow::Result<i32> {
    if label.is_none() && uuid.is_none() && designator.is_none() {
        anyhow::bail!("one of --label, --uuid or --designator is required");
    }
    let project = load_project(args).await?;

    let found = if let Some(text) = label {
        let matches = project.find_labels_by_name(&text);
        match args.format {
            OutputFormat::Json => print_json(&matches)?,
            OutputFormat::Human => {
                for net in matches {
                    println!("{}  {}  {}", net.text, net.filename, net.uuid);
                }
            }
        }
        !matches.is_empty()
    } else if let Some(uuid) = uuid {
        let net = project.find_net_item(&uuid);
        match (args.format, net) {
            (OutputFormat::Json, _) => print_json(&net)?,
            (OutputFormat::Human, Some(net)) => println!("{}  {}  {}", net.text, net.filename, net.uuid),
            (OutputFormat::Human, None) => {}
        }
        net.is_some()
    } else if let Some(reference) = designator {
        let place = project.find_designator(&reference);
        match (args.format, place) {
            (OutputFormat::Json, _) => print_json(&place)?,
            (OutputFormat::Human, Some(place)) => {
                println!("{}  {}  {}", reference, place.sheet, place.uuid)
            }
            (OutputFormat::Human, None) => {}
        }
        place.is_some()
    } else {
        false
    };

    if !found {
        eprintln!("No matches");
        return Ok(1);
    }
    Ok(0)
}

async fn handle_summary(args: &ProjectArgs) -> anyhow::Result<i32> {
    let project = load_project(args).await?;
    let summary = project.summary();

    match args.format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Human => {
            println!("\nProject: {}", summary.project_name);
            println!("{}", "─".repeat(60));
            println!("  Schematics: {}", summary.schematic_count);
            println!("  Boards:     {}", summary.board_count);
            println!(
                "  Hierarchy:  {}",
                if summary.hierarchy_resolved { "resolved" } else { "flat" }
            );
            println!("  Pages:      {}", summary.pages.len());
            println!(
                "  BOM:        {} rows, {} parts (from {:?})",
                summary.bom.len(),
                summary.bom.iter().map(|row| row.qty()).sum::<usize>(),
                summary.bom_source
            );
        }
    }
    Ok(0)
}
