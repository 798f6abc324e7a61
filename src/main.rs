//! CLI entry point for the ad analytics engine.
//!
//! Metrics commands run the traffic simulator in-process and report on the
//! result. Matching commands load the embedding model, seed the in-memory
//! indexes and query them.

use adlens::catalog::Catalog;
use adlens::config::SimulatorConfig;
use adlens::display::{
    create_ad_table, create_audience_table, create_insight_table, create_leaderboard_table,
    create_matches_table, create_questions_table,
};
use adlens::insights::{InsightCalculator, RankBy};
use adlens::storage::{AdMetrics, MetricsStore};
use adlens::types::{CategoryId, CompanyId};
use adlens::vector::{FastEmbedGenerator, InMemoryVectorIndex};
use adlens::{AdEngine, Settings, TrafficSimulator};
use anyhow::Context;
use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Ad analytics and audience matching
#[derive(Parser)]
#[command(
    name = "adlens",
    version = env!("CARGO_PKG_VERSION"),
    about = "Ad analytics and audience matching",
    long_about = "Simulate ad traffic, rank ads by derived KPIs, and match ads to physician audiences with text embeddings.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (overrides logging.level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Simulated traffic options shared by the metrics commands
#[derive(Args, Clone, Copy)]
struct TrafficArgs {
    /// Simulator ticks to run before reporting
    #[arg(long, default_value = "10")]
    ticks: u32,

    /// Seed for reproducible traffic (overrides simulator.seed)
    #[arg(long)]
    seed: Option<u64>,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .adlens directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .adlens/settings.toml")]
    Config,

    /// Run the traffic simulator and summarize per company
    #[command(
        about = "Generate synthetic traffic and show company insights",
        after_help = "Examples:\n  adlens simulate --ticks 60\n  adlens simulate --ticks 5 --seed 42 --json"
    )]
    Simulate {
        #[command(flatten)]
        traffic: TrafficArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Rank ads by CTR or viewability
    #[command(after_help = "Examples:\n  adlens leaderboard --by ctr --limit 3\n  adlens leaderboard --by viewability --json")]
    Leaderboard {
        /// Ratio to rank on: ctr or viewability
        #[arg(long, default_value = "ctr")]
        by: RankBy,

        /// Number of ads to show
        #[arg(short, long, default_value = "5")]
        limit: usize,

        #[command(flatten)]
        traffic: TrafficArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// KPIs for one ad, company or category
    #[command(after_help = "Examples:\n  adlens insights --ad ibrance_banner\n  adlens insights --company pfizer\n  adlens insights --category breast-cancer --json")]
    Insights {
        #[command(flatten)]
        target: InsightTarget,

        #[command(flatten)]
        traffic: TrafficArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Nearest physicians for an ad's primary category
    #[command(name = "match", after_help = "Examples:\n  adlens match ibrance_banner")]
    Match {
        /// Ad identifier
        ad: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Physician audience across every category a company bought
    #[command(after_help = "Examples:\n  adlens audience pfizer\n  adlens audience eli-lilly --json")]
    Audience {
        /// Company slug
        company: CompanyId,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Pick the ad to show next to a question
    #[command(after_help = "Examples:\n  adlens ask \"first-line options for HR+ metastatic breast cancer\"")]
    Ask {
        /// Free-text question
        question: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Sample sponsored questions
    Questions {
        /// How many to show (all when omitted)
        #[arg(short)]
        n: Option<usize>,

        /// Seed for the sample
        #[arg(long)]
        seed: Option<u64>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct InsightTarget {
    /// Ad identifier
    #[arg(long)]
    ad: Option<String>,

    /// Company slug
    #[arg(long)]
    company: Option<CompanyId>,

    /// Category slug
    #[arg(long)]
    category: Option<CategoryId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LabeledInsight {
    name: String,
    #[serde(flatten)]
    insight: adlens::insights::AdInsight,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(1);
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    init_tracing(&settings, cli.verbose);

    if let Err(e) = run(cli, settings).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(settings: &Settings, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli, settings: Settings) -> anyhow::Result<()> {
    settings.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("could not write configuration file")?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Simulate { traffic, json } => {
            let catalog = Catalog::seeded();
            let store = MetricsStore::new();
            let written = simulate(&catalog, &store, &settings.simulator, traffic)?;
            let calc = InsightCalculator::new(&catalog, &store);

            let rows: Vec<LabeledInsight> = catalog
                .list_companies()
                .iter()
                .map(|c| LabeledInsight {
                    name: c.name.clone(),
                    insight: calc.insight_for_company(c.id),
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!(
                    "{} ticks: {} impressions, {} viewable, {} clicks",
                    traffic.ticks, written.impressions, written.viewable_impressions, written.clicks
                );
                print_insights(rows);
            }
        }

        Commands::Leaderboard {
            by,
            limit,
            traffic,
            json,
        } => {
            let catalog = Catalog::seeded();
            let store = MetricsStore::new();
            simulate(&catalog, &store, &settings.simulator, traffic)?;
            let top = InsightCalculator::new(&catalog, &store).top_by(by, limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&top)?);
            } else {
                println!("{}", create_leaderboard_table(by, &top));
            }
        }

        Commands::Insights {
            target,
            traffic,
            json,
        } => {
            let catalog = Catalog::seeded();
            let store = MetricsStore::new();
            simulate(&catalog, &store, &settings.simulator, traffic)?;
            let calc = InsightCalculator::new(&catalog, &store);

            let row = match (target.ad, target.company, target.category) {
                (Some(ad), _, _) => {
                    let record = catalog
                        .ad(&ad)
                        .with_context(|| format!("unknown ad '{ad}'"))?;
                    LabeledInsight {
                        name: record.headline.clone(),
                        insight: calc.insight_for_ad(&ad),
                    }
                }
                (_, Some(company), _) => LabeledInsight {
                    name: catalog.company_name(company),
                    insight: calc.insight_for_company(company),
                },
                (_, _, Some(category)) => LabeledInsight {
                    name: catalog
                        .category(category)
                        .map_or_else(|| category.to_string(), |c| c.label.clone()),
                    insight: calc.insight_for_category(category),
                },
                (None, None, None) => anyhow::bail!("one of --ad, --company or --category is required"),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&row)?);
            } else {
                print_insights(vec![row]);
            }
        }

        Commands::Match { ad, json } => {
            let engine = build_engine(&settings, cli.verbose).await?;
            let matches = engine.match_physicians(&ad).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else if matches.is_empty() {
                println!("No physicians matched {ad}");
            } else {
                println!("{}", create_matches_table(&matches));
            }
        }

        Commands::Audience { company, json } => {
            let engine = build_engine(&settings, cli.verbose).await?;
            let report = engine.audience_report(company).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Physician audience for {}", report.company.name);
                println!("{}", create_audience_table(&report));
                if !report.unmatched.is_empty() {
                    let skipped: Vec<&str> = report.unmatched.iter().map(|c| c.as_str()).collect();
                    println!("No matches for: {}", skipped.join(", "));
                }
            }
        }

        Commands::Ask { question, json } => {
            let engine = build_engine(&settings, cli.verbose).await?;
            let chosen = engine.select_ad_for_question(&question).await?;

            match (chosen, json) {
                (chosen, true) => println!("{}", serde_json::to_string_pretty(&chosen)?),
                (Some(ad), false) => println!("{}", create_ad_table(&ad)),
                (None, false) => println!("No ad for this question"),
            }
        }

        Commands::Questions { n, seed, json } => {
            let catalog = Catalog::seeded();
            let questions = match n {
                Some(n) => {
                    let mut rng = seeded_rng(seed.or(settings.simulator.seed));
                    catalog.sample_sponsored_questions(n, &mut rng)
                }
                None => catalog.list_sponsored_questions().iter().collect(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&questions)?);
            } else {
                println!("{}", create_questions_table(&questions));
            }
        }
    }

    Ok(())
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Run simulator ticks back to back instead of on the timer
fn simulate(
    catalog: &Catalog,
    store: &MetricsStore,
    config: &SimulatorConfig,
    traffic: TrafficArgs,
) -> anyhow::Result<AdMetrics> {
    let simulator = TrafficSimulator::new(catalog, store.clone(), config.clone())?;
    let mut rng = seeded_rng(traffic.seed.or(config.seed));
    Ok((0..traffic.ticks).map(|_| simulator.tick(&mut rng)).sum())
}

fn print_insights(rows: Vec<LabeledInsight>) {
    let rows: Vec<_> = rows.into_iter().map(|r| (r.name, r.insight)).collect();
    println!("{}", create_insight_table(&rows));
}

async fn build_engine(
    settings: &Settings,
    verbose: bool,
) -> anyhow::Result<AdEngine<FastEmbedGenerator, InMemoryVectorIndex>> {
    let model = settings.embedding.model.clone();
    let cache_dir = settings.embedding.models_dir();
    let embedder = tokio::task::spawn_blocking(move || {
        FastEmbedGenerator::new(&model, &cache_dir, verbose)
    })
    .await?
    .context("failed to load embedding model")?;

    let engine = AdEngine::new(
        Arc::new(Catalog::seeded()),
        MetricsStore::new(),
        embedder,
        InMemoryVectorIndex::new(),
        Arc::new(settings.clone()),
    )?;
    engine.seed_indexes().await.context("failed to seed vector indexes")?;
    Ok(engine)
}
