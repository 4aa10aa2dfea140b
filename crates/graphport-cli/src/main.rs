//! CLI entry point for the graphport graph store.
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use graphport_core::{GraphStore, Link, LinkDelta, Node, NodeDelta, Properties, RawQuery};
use graphport_neo4j::{GraphConfig, Neo4jAdapter};

#[derive(Parser)]
#[command(name = "graphport")]
#[command(about = "Read and write a property graph through the graphport storage port")]
struct Cli {
    /// Config file prefix (default: graphport).
    #[arg(short, long, default_value = "graphport")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every node and link.
    ReadGraph,
    /// Run a Cypher query and assemble its nodes and links. Changes it makes are rolled back.
    Query {
        text: String,
        /// Result columns to inspect (default: n, r, m).
        #[arg(long = "column")]
        columns: Vec<String>,
    },
    ReadNode {
        id: String,
    },
    /// Create or fully replace a node.
    SetNode {
        /// Node id; a fresh one is generated when omitted.
        #[arg(long)]
        id: Option<String>,
        #[arg(short, long = "label")]
        labels: Vec<String>,
        /// Properties as a JSON object.
        #[arg(short, long)]
        props: Option<String>,
    },
    /// Add labels and merge properties into a node.
    PatchNode {
        id: String,
        #[arg(short, long = "label")]
        labels: Vec<String>,
        #[arg(short, long)]
        props: Option<String>,
    },
    DeleteNode {
        id: String,
    },
    ReadLink {
        id: String,
    },
    /// Create or fully replace a link between two existing nodes.
    SetLink {
        #[arg(long)]
        id: Option<String>,
        #[arg(short, long)]
        label: String,
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(short, long)]
        props: Option<String>,
    },
    /// Relabel a link and/or merge properties into it.
    PatchLink {
        id: String,
        #[arg(short, long)]
        label: Option<String>,
        #[arg(short, long)]
        props: Option<String>,
    },
    DeleteLink {
        id: String,
    },
    /// Delete every node and link.
    Clear {
        /// Required confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Generate an id that is not in use.
    NewId {
        #[arg(value_enum)]
        kind: IdKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum IdKind {
    Node,
    Link,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let graph_config = load_graph_config(&cli.config)?;
    let store = Neo4jAdapter::connect(&graph_config).await?;
    tracing::info!(adapter = store.name(), "Graph store ready");

    let outcome = run(&store, cli.command).await;
    port(store.close().await)?;
    outcome
}

async fn run(store: &impl GraphStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::ReadGraph => print_json(&port(store.read_graph().await)?),
        Command::Query { text, columns } => {
            let mut query = RawQuery::new(text);
            if !columns.is_empty() {
                query = query.with_columns(columns);
            }
            print_json(&port(store.query_graph(Some(&query)).await)?)
        }
        Command::ReadNode { id } => print_json(&port(store.read_node(&id).await)?),
        Command::SetNode { id, labels, props } => {
            let id = match id {
                Some(id) => id,
                None => port(store.generate_node_id().await)?,
            };
            let node = Node::new(id, labels, parse_properties(props.as_deref())?)?;
            print_json(&port(store.set_node(&node).await)?)
        }
        Command::PatchNode { id, labels, props } => {
            let delta = NodeDelta {
                labels: (!labels.is_empty()).then_some(labels),
                properties: props.as_deref().map(|p| parse_properties(Some(p))).transpose()?,
            };
            match port(store.patch_node(&id, &delta).await)? {
                Some(node) => print_json(&node),
                None => anyhow::bail!("Node {id} does not exist"),
            }
        }
        Command::DeleteNode { id } => print_json(&port(store.delete_node(&id).await)?),
        Command::ReadLink { id } => print_json(&port(store.read_link(&id).await)?),
        Command::SetLink {
            id,
            label,
            source,
            target,
            props,
        } => {
            let id = match id {
                Some(id) => id,
                None => port(store.generate_link_id().await)?,
            };
            let link = Link::new(id, label, parse_properties(props.as_deref())?, source, target)?;
            match port(store.set_link(&link).await)? {
                Some(link) => print_json(&link),
                None => anyhow::bail!(
                    "Link endpoints {} -> {} do not both exist",
                    link.source(),
                    link.target()
                ),
            }
        }
        Command::PatchLink { id, label, props } => {
            let delta = LinkDelta {
                label,
                properties: props.as_deref().map(|p| parse_properties(Some(p))).transpose()?,
            };
            print_json(&port(store.patch_link(&id, &delta).await)?)
        }
        Command::DeleteLink { id } => print_json(&port(store.delete_link(&id).await)?),
        Command::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to clear the graph without --yes");
            }
            port(store.clear_graph().await)
        }
        Command::NewId { kind } => {
            let id = match kind {
                IdKind::Node => port(store.generate_node_id().await)?,
                IdKind::Link => port(store.generate_link_id().await)?,
            };
            println!("{id}");
            Ok(())
        }
    }
}

/// Log the developer detail of a port failure and surface the short message.
fn port<T>(result: graphport_core::Result<T>) -> anyhow::Result<T> {
    result.map_err(|e| {
        tracing::error!(error = %e.dev_message(), "Graph store operation failed");
        let message = e.user_message();
        anyhow::Error::new(e).context(message)
    })
}

fn parse_properties(raw: Option<&str>) -> anyhow::Result<Properties> {
    match raw {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Properties must be a JSON object of scalars and lists: {e}")),
        None => Ok(Properties::new()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_graph_config(file_prefix: &str) -> anyhow::Result<GraphConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("GRAPHPORT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<GraphConfig>("neo4j") {
        Ok(c) => Ok(c),
        Err(_) => Ok(GraphConfig::default()),
    }
}
