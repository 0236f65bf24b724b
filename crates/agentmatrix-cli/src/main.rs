use agentmatrix_api::{init_tracing, Server};
use agentmatrix_core::{
    compute_agent_stats, compute_feature_stats, is_cell_visible, rank_agents, validate_dataset,
    ConfigManager, DataContext, EntityStore, FileEntityStore, FilterCriteria, FilterQuery,
    Settings, SupportLevel,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

#[derive(Parser)]
#[command(name = "agentmatrix")]
#[command(about = "AgentMatrix - compare AI coding agents feature by feature", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (table, json)
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Directory holding default.toml / <env>.toml / local.toml
    #[arg(long, global = true, env = "AGENTMATRIX_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Configuration environment (development, production, ...)
    #[arg(long, global = true)]
    env: Option<String>,

    /// Data directory, overrides `data.dir`
    #[arg(long, global = true, env = "AGENTMATRIX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check the dataset for missing fields, duplicates and dangling references
    Validate,

    /// Print the (filtered) comparison matrix
    Matrix {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print ranked statistics for the (filtered) matrix
    Stats {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show one agent and its support for every feature
    Agent {
        /// Agent id or alias
        slug: String,
    },

    /// Show one feature and how every agent supports it
    Feature {
        /// Feature id or alias
        slug: String,
    },

    /// Print the JSON Schema of the settings files
    Schema {
        /// Write the schema to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Comma-separated agent ids
    #[arg(long)]
    agents: Option<String>,

    /// Comma-separated feature ids
    #[arg(long)]
    features: Option<String>,

    /// Comma-separated categories
    #[arg(long)]
    categories: Option<String>,

    /// Comma-separated support levels to highlight
    #[arg(long)]
    levels: Option<String>,

    /// Free-text search over names, aliases and descriptions
    #[arg(short, long)]
    query: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> Result<FilterCriteria> {
        let query = FilterQuery {
            agents: self.agents.clone(),
            features: self.features.clone(),
            categories: self.categories.clone(),
            levels: self.levels.clone(),
            q: self.query.clone(),
        };
        FilterCriteria::from_query(&query).context("Invalid filter")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let level = match (&cli.command, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Commands::Serve { .. }, false) => settings.logging.level.clone(),
        _ => "warn".to_string(),
    };
    init_tracing(&level);

    if let Err(e) = execute_command(&cli, settings).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let manager = match &cli.config_dir {
        Some(dir) => ConfigManager::with_dir(dir.clone(), cli.env.clone()),
        None => ConfigManager::new(cli.env.clone()),
    }
    .context("Failed to load configuration")?;

    let mut settings = manager.into_settings();
    if let Some(dir) = &cli.data_dir {
        settings.data.dir = dir.clone();
    }
    Ok(settings)
}

async fn execute_command(cli: &Cli, mut settings: Settings) -> Result<()> {
    if let Commands::Serve { host, port } = &cli.command {
        if let Some(host) = host {
            settings.server.host = host.clone();
        }
        if let Some(port) = port {
            settings.server.port = *port;
        }
        settings.validate()?;
        let server = Server::new(Arc::new(settings))
            .await
            .context("Failed to start API server")?;
        server.run().await?;
        return Ok(());
    }

    if let Commands::Schema { out } = &cli.command {
        return execute_schema(out.as_deref());
    }

    let ctx = DataContext::new(FileEntityStore::new(&settings.data.dir));
    match &cli.command {
        Commands::Serve { .. } | Commands::Schema { .. } => Ok(()),
        Commands::Validate => execute_validate(&cli.output, &ctx),
        Commands::Matrix { filters } => execute_matrix(&cli.output, &ctx, filters),
        Commands::Stats { filters } => execute_stats(&cli.output, &ctx, filters),
        Commands::Agent { slug } => execute_agent(&cli.output, &ctx, slug),
        Commands::Feature { slug } => execute_feature(&cli.output, &ctx, slug),
    }
}

fn execute_schema(out: Option<&Path>) -> Result<()> {
    let content = serde_json::to_string_pretty(&Settings::json_schema())?;
    match out {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", format!("Schema written to {}", path.display()).green());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn execute_validate(format: &OutputFormat, ctx: &DataContext<FileEntityStore>) -> Result<()> {
    let store = ctx.store();
    let agents = store.load_agents().context("Failed to load agents")?;
    let features = store.load_features().context("Failed to load features")?;
    let records = store
        .load_support_records()
        .context("Failed to load support records")?;
    let report = validate_dataset(&agents, &features, &records);

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!(
                "{} {} agents, {} features, {} support records",
                "Checked".cyan().bold(),
                report.agents_checked.to_string().yellow(),
                report.features_checked.to_string().yellow(),
                report.records_checked.to_string().yellow()
            );
            for issue in &report.issues {
                println!("  {} {}", "-".red(), issue);
            }
            if report.is_valid() {
                println!("{}", "Dataset is valid".green().bold());
            }
        }
    }

    if !report.is_valid() {
        bail!("{} issue(s) found", report.issues.len());
    }
    Ok(())
}

fn symbol(level: SupportLevel) -> &'static str {
    match level {
        SupportLevel::Yes => "yes",
        SupportLevel::Partial => "partial",
        SupportLevel::No => "no",
        SupportLevel::Unknown => "?",
    }
}

fn execute_matrix(
    format: &OutputFormat,
    ctx: &DataContext<FileEntityStore>,
    filters: &FilterArgs,
) -> Result<()> {
    let criteria = filters.criteria()?;
    let view = ctx.view(&criteria)?;
    let matrix = view.project_matrix();
    let statistics = view.global_stats();

    if let OutputFormat::Json = format {
        return print_json(&json!({ "matrix": matrix, "statistics": statistics }));
    }

    if view.agents.is_empty() || view.features.is_empty() {
        println!("{}", "No agents or features match the filters".yellow());
        return Ok(());
    }

    let mut builder = Builder::default();
    let mut header = vec!["Agent".to_string()];
    header.extend(view.features.iter().map(|f| f.name.clone()));
    builder.push_record(header);

    for agent in &view.agents {
        let mut row = vec![agent.name.clone()];
        for feature in &view.features {
            let text = match matrix.cell(&agent.id, &feature.id) {
                Some(cell) if is_cell_visible(cell, &criteria.support_levels) => {
                    symbol(cell.level).to_string()
                }
                _ => String::new(),
            };
            row.push(text);
        }
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{}", table);
    println!(
        "{} {}% across {} comparisons",
        "Overall support:".cyan().bold(),
        statistics.overall_support_percentage.to_string().yellow(),
        statistics.total_comparisons
    );
    Ok(())
}

#[derive(Tabled)]
struct AgentStatsRow {
    #[tabled(rename = "#")]
    rank: usize,
    agent: String,
    yes: usize,
    partial: usize,
    no: usize,
    unknown: usize,
    support: String,
}

#[derive(Tabled)]
struct CategoryRow {
    category: String,
    features: usize,
    support: String,
}

fn execute_stats(
    format: &OutputFormat,
    ctx: &DataContext<FileEntityStore>,
    filters: &FilterArgs,
) -> Result<()> {
    let criteria = filters.criteria()?;
    let view = ctx.view(&criteria)?;
    let mut agents = view.agent_stats();
    rank_agents(&mut agents);
    let categories = view.category_stats();
    let global = view.global_stats();

    if let OutputFormat::Json = format {
        return print_json(&json!({
            "agents": agents,
            "categories": categories,
            "global": global,
        }));
    }

    let rows: Vec<AgentStatsRow> = agents
        .iter()
        .enumerate()
        .map(|(i, s)| AgentStatsRow {
            rank: i + 1,
            agent: s.agent_id.clone(),
            yes: s.counts.yes,
            partial: s.counts.partial,
            no: s.counts.no,
            unknown: s.counts.unknown,
            support: format!("{}%", s.support_percentage),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            category: c.category.to_string(),
            features: c.feature_count,
            support: format!("{}%", c.support_percentage),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    println!(
        "{} {} agents x {} features, {}% supported",
        "Global:".cyan().bold(),
        global.total_agents,
        global.total_features,
        global.overall_support_percentage.to_string().yellow()
    );
    if let Some(date) = &global.last_updated {
        println!("{} {}", "Last verified:".cyan().bold(), date);
    }
    Ok(())
}

#[derive(Tabled)]
struct FeatureSupportRow {
    feature: String,
    category: String,
    support: String,
    notes: String,
}

fn execute_agent(format: &OutputFormat, ctx: &DataContext<FileEntityStore>, slug: &str) -> Result<()> {
    let Some(agent) = ctx.find_agent(slug)? else {
        bail!("Agent not found: {}", slug);
    };
    let stats = compute_agent_stats(&agent.id, ctx.matrix()?, ctx.features()?);
    let support = ctx.agent_support(&agent.id)?;

    if let OutputFormat::Json = format {
        return print_json(&json!({ "agent": agent, "stats": stats, "support": support }));
    }

    println!("{} ({})", agent.name.bold(), agent.provider.cyan());
    if !agent.description.is_empty() {
        println!("{}", agent.description);
    }
    if !agent.website.is_empty() {
        println!("{}", agent.website.blue());
    }
    println!(
        "{} {}%",
        "Support:".cyan().bold(),
        stats.support_percentage.to_string().yellow()
    );

    let rows: Vec<FeatureSupportRow> = support
        .iter()
        .map(|s| FeatureSupportRow {
            feature: s.feature.name.clone(),
            category: s.feature.category.to_string(),
            support: symbol(s.cell.level).to_string(),
            notes: s.cell.notes.clone().unwrap_or_default(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

#[derive(Tabled)]
struct AgentSupportRow {
    agent: String,
    provider: String,
    support: String,
    verified: String,
}

fn execute_feature(
    format: &OutputFormat,
    ctx: &DataContext<FileEntityStore>,
    slug: &str,
) -> Result<()> {
    let Some(feature) = ctx.find_feature(slug)? else {
        bail!("Feature not found: {}", slug);
    };
    let stats = compute_feature_stats(&feature.id, ctx.matrix()?, ctx.agents()?);
    let support = ctx.feature_support(&feature.id)?;

    if let OutputFormat::Json = format {
        return print_json(&json!({ "feature": feature, "stats": stats, "agentSupport": support }));
    }

    println!("{} [{}]", feature.name.bold(), feature.category.to_string().cyan());
    if !feature.description.is_empty() {
        println!("{}", feature.description);
    }
    println!(
        "{} {}% ({} of {} agents)",
        "Support:".cyan().bold(),
        stats.support_percentage.to_string().yellow(),
        stats.supported_agents.len(),
        stats.total_agents
    );

    let rows: Vec<AgentSupportRow> = support
        .iter()
        .map(|s| AgentSupportRow {
            agent: s.agent.name.clone(),
            provider: s.agent.provider.clone(),
            support: symbol(s.cell.level).to_string(),
            verified: s.cell.last_verified.clone().unwrap_or_default(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
