//! Factory Graph
//!
//! Builds and inspects production dependency graphs for crafting chains.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use factory_graph::layout::LayoutSession;
use factory_graph::{
    ItemId, MachineGraph, NodeId, RecipeCatalog, convert_graph, db, extract, generate_graph, report,
    validate_graph,
};

#[derive(Parser)]
#[command(name = "factory-graph")]
#[command(about = "Production dependency graph builder for factory crafting chains")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "factory_data.db")]
    database: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Use the built-in sample catalog instead of the database
    #[arg(long)]
    builtin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Level-by-level listing
    Text,
    /// Graphviz digraph
    Dot,
    /// Production steps and raw inputs
    Summary,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract recipe data from Lua prototype files
    Extract {
        /// Path to the prototype directory
        source_dir: PathBuf,

        /// Clear existing data before extraction
        #[arg(long)]
        clear: bool,
    },

    /// Build the dependency graph for one or more target items
    Graph {
        /// Target items (e.g., "TransportBelt", "ElectronicCircuit")
        #[arg(required = true)]
        items: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        /// Canvas width used for layout
        #[arg(long, default_value = "1280")]
        width: f64,

        /// Canvas height used for layout
        #[arg(long, default_value = "720")]
        height: f64,
    },

    /// Generate and validate graphs without printing them
    Validate {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// List all items in the catalog
    ListItems {
        /// Only list raw resources
        #[arg(long)]
        raw: bool,
    },

    /// Show details for a specific item
    Item {
        /// Item ID
        id: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load the built-in sample catalog into the database
    LoadSample,
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("factory_graph={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(cli: &Cli) -> Result<Connection> {
    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;
    debug!(path = %cli.database.display(), "opened database");
    Ok(conn)
}

fn load_catalog(cli: &Cli) -> Result<RecipeCatalog> {
    if cli.builtin {
        return Ok(RecipeCatalog::sample());
    }

    let conn = open_database(cli)?;
    let catalog = db::load_catalog(&conn)?;
    if catalog.is_empty() {
        anyhow::bail!("No items in database. Run 'extract' or 'load-sample' first, or pass --builtin.");
    }
    debug!(items = catalog.len(), "loaded catalog");
    Ok(catalog)
}

fn build(catalog: &RecipeCatalog, items: &[String]) -> Result<(MachineGraph, Vec<NodeId>)> {
    let targets = items
        .iter()
        .map(|name| catalog.lookup(name))
        .collect::<Result<Vec<ItemId>, _>>()?;

    let mut machines = MachineGraph::new();
    let outputs = generate_graph(catalog, &mut machines, &targets)
        .with_context(|| format!("Failed to build graph for {}", items.join(", ")))?;
    validate_graph(&machines, &outputs)?;
    Ok((machines, outputs))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match &cli.command {
        Commands::Extract { source_dir, clear } => {
            let mut conn = open_database(&cli)?;
            if *clear {
                info!("clearing existing catalog");
                db::clear_catalog(&conn)?;
            }

            let stats = extract::extract_to_database(&mut conn, source_dir)?;
            println!("{}", stats);
        }

        Commands::Graph {
            items,
            format,
            width,
            height,
        } => {
            let catalog = load_catalog(&cli)?;
            let (machines, outputs) = build(&catalog, items)?;
            let mut graph = convert_graph(&machines, &outputs)?;

            let mut session = LayoutSession::new(*width, *height);
            session.arrange(&mut graph);
            session.assign_colors(&mut graph);

            match format {
                Format::Text => print!("{}", report::format_graph(&graph)),
                Format::Dot => print!("{}", report::to_dot(&graph)),
                Format::Summary => print!("{}", report::summarize_graph(&machines, &graph)?),
            }
        }

        Commands::Validate { items } => {
            let catalog = load_catalog(&cli)?;
            catalog.check()?;
            let (machines, _) = build(&catalog, items)?;
            println!("OK: {} nodes for {}", machines.len(), items.join(", "));
        }

        Commands::ListItems { raw } => {
            let items = if cli.builtin {
                let catalog = RecipeCatalog::sample();
                let ids: Vec<&ItemId> = if *raw {
                    catalog.raw_items().collect()
                } else {
                    catalog.items().map(|(id, _)| id).collect()
                };
                let mut ids: Vec<String> = ids.into_iter().map(ItemId::to_string).collect();
                ids.sort();
                ids
            } else {
                let conn = open_database(&cli)?;
                if *raw {
                    db::list_raw_items(&conn)?
                } else {
                    db::list_items(&conn)?
                }
            };

            if items.is_empty() {
                println!("No items in database. Run 'extract' or 'load-sample' first.");
            } else {
                for item in items {
                    println!("  {}", item);
                }
            }
        }

        Commands::Item { id } => {
            let catalog = load_catalog(&cli)?;
            match catalog.get(&ItemId::from(id.as_str())) {
                Some(info) => {
                    println!("Item: {}", id);
                    println!("  Time: {}s", info.time);
                    if info.is_raw() {
                        println!("  Raw resource");
                    } else {
                        println!("  Ingredients:");
                        for (ingredient, quantity) in &info.recipe {
                            println!("    {}x {}", quantity, ingredient);
                        }
                    }
                    if !info.producers.is_empty() {
                        println!("  Producers: {}", info.producers.join(", "));
                    }
                }
                None => println!("Item '{}' not found", id),
            }
        }

        Commands::Init => {
            open_database(&cli)?;
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let mut conn = open_database(&cli)?;
            db::clear_catalog(&conn)?;
            let count = db::store_catalog(&mut conn, &RecipeCatalog::sample())?;
            println!("Loaded {} sample items", count);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(database: &std::path::Path, args: &[&str]) -> Cli {
        let mut argv = vec!["factory-graph", "--database", database.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn builtin_catalog_leaves_database_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factory_data.db");

        let cli = parse(&path, &["--builtin", "validate", "TransportBelt"]);
        let catalog = load_catalog(&cli).unwrap();
        assert!(catalog.contains(&"TransportBelt".into()));
        assert!(!path.exists());

        let cli = parse(&path, &["init"]);
        open_database(&cli).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&dir.path().join("empty.db"), &["item", "IronPlate"]);

        let err = load_catalog(&cli).unwrap_err();
        assert!(err.to_string().contains("No items in database"));
    }
}
