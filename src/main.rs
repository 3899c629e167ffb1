use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use catalog_match::db::{self, CatalogTable};
use catalog_match::logging::{init_logging, LogConfig};
use catalog_match::{
    import_dir, match_request, Config, ExtractedEntities, MatchRequest,
    SqliteCatalog, Stage,
};

#[derive(Parser)]
#[command(name = "catalog-match", version, about = "Resolve inspection phrases against the vehicle catalog")]
struct Cli {
    /// SQLite catalog file (overrides config and CATALOG_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the catalog schema
    Init,

    /// Import catalog CSV files from a directory
    Import { dir: PathBuf },

    /// Print one catalog kind as JSON
    List {
        #[arg(value_enum)]
        kind: Kind,

        /// Only items of this stage
        #[arg(long)]
        stage: Option<Stage>,
    },

    /// Match free text or separated fields against the catalog
    Match {
        /// Whole free-text finding
        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        item: Option<String>,

        #[arg(long)]
        position: Option<String>,

        #[arg(long)]
        damage: Option<String>,

        #[arg(long)]
        severity: Option<String>,

        /// Restrict item candidates to one stage
        #[arg(long)]
        stage: Option<Stage>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Items,
    Positions,
    DamageTypes,
    Severities,
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose).compact())?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    let catalog = SqliteCatalog::new(&config.db_path);

    match cli.command {
        Command::Init => run_init(&catalog),
        Command::Import { dir } => run_import(&catalog, &dir),
        Command::List { kind, stage } => run_list(&catalog, kind, stage).await,
        Command::Match {
            text,
            item,
            position,
            damage,
            severity,
            stage,
        } => {
            let any_field =
                item.is_some() || position.is_some() || damage.is_some() || severity.is_some();
            let request = MatchRequest {
                text,
                entities: any_field.then(|| ExtractedEntities {
                    item_text: item,
                    position_text: position,
                    damage_text: damage,
                    severity_text: severity,
                }),
                stage,
            };
            run_match(&catalog, &request).await
        }
    }
}

fn run_init(catalog: &SqliteCatalog) -> Result<()> {
    catalog
        .connect()
        .with_context(|| format!("Failed to initialize {:?}", catalog.path()))?;
    info!(db = %catalog.path().display(), "catalog schema ready");
    Ok(())
}

fn run_import(catalog: &SqliteCatalog, dir: &std::path::Path) -> Result<()> {
    let conn = catalog
        .connect()
        .with_context(|| format!("Failed to open {:?}", catalog.path()))?;

    let report = import_dir(&conn, dir)?;

    info!(
        imported = report.total_imported(),
        errors = report.total_errors(),
        "import finished"
    );
    for table in CatalogTable::ALL {
        info!(table = table.table_name(), rows = db::count_rows(&conn, table)?, "catalog size");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_list(catalog: &SqliteCatalog, kind: Kind, stage: Option<Stage>) -> Result<()> {
    use catalog_match::CatalogSource;

    let json = match kind {
        Kind::Items => serde_json::to_string_pretty(&catalog.items(stage).await?)?,
        Kind::Positions => serde_json::to_string_pretty(&catalog.positions().await?)?,
        Kind::DamageTypes => serde_json::to_string_pretty(&catalog.damage_types().await?)?,
        Kind::Severities => serde_json::to_string_pretty(&catalog.severities().await?)?,
        Kind::Categories => serde_json::to_string_pretty(&catalog.read(db::categories).await?)?,
    };

    println!("{}", json);
    Ok(())
}

async fn run_match(catalog: &SqliteCatalog, request: &MatchRequest) -> Result<()> {
    let result = match_request(catalog, request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
