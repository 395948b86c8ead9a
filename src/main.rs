use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use tracing::info;
use tracing_subscriber::EnvFilter;

use odoo_ops::config::{
    self, KeySource, OpsConfig, DEFAULT_CONF_DIR, DEFAULT_ENV_FILE, DEFAULT_OUTPUT_DIR,
    DEFAULT_PRICELIST_DELAY_MS, DEFAULT_RELOCATE_DELAY_MS,
};
use odoo_ops::export::{export_json, render, TableRow};
use odoo_ops::odoo::Odoo;
use odoo_ops::pricelist::{self, PricelistSync};
use odoo_ops::{putaway, reports};

#[derive(Parser, Debug)]
#[command(name = "odoo-ops", about = "Reports and maintenance jobs for an Odoo instance")]
struct Cli {
    /// Environment file loaded before reading credentials
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Directory holding the key file
    #[arg(long, default_value = DEFAULT_CONF_DIR)]
    conf_dir: PathBuf,

    /// Key file name inside the configuration directory
    #[arg(long, env = config::ENV_ACCESS_KEY)]
    key_file: Option<String>,

    /// Entry of the key file to use
    #[arg(long, env = config::ENV_ACCESS_KEY_INDEX)]
    key_index: Option<usize>,

    /// Select the key by alias instead of index
    #[arg(long)]
    alias: Option<String>,

    /// Directory receiving exported tables
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Log intended writes without sending them
    #[arg(long)]
    dry_run: bool,

    /// Pause after each quant relocation, in milliseconds
    #[arg(long, default_value_t = DEFAULT_RELOCATE_DELAY_MS)]
    relocate_delay_ms: u64,

    /// Pause after each pricelist item write, in milliseconds
    #[arg(long, default_value_t = DEFAULT_PRICELIST_DELAY_MS)]
    pricelist_delay_ms: u64,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the server version
    Version,
    /// Stock quantities in the main stock location
    Quants,
    /// Active single-variant products
    Products,
    /// Sale orders and their lines
    Sales {
        /// Salesperson ids to leave out
        #[arg(long, value_delimiter = ',')]
        exclude_users: Vec<i64>,
    },
    /// Purchase orders and their lines
    Purchases {
        /// Vendor ids to leave out
        #[arg(long, value_delimiter = ',')]
        exclude_partners: Vec<i64>,
    },
    /// Product templates by id, archived ones included
    Templates {
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<i64>,
    },
    /// Move quants on putaway rule entry locations to their storage locations
    Relocate,
    /// Create or update pricelist items from a VIP price export
    PricelistSync {
        /// VIP export (`{"data": [...]}`)
        #[arg(long, default_value = "temp/vip_price.json")]
        vip_file: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

fn show<T: TableRow + serde::Serialize>(rows: &[T], ops: &OpsConfig, name: &str) -> Result<()> {
    println!("{}", render(rows));
    println!("{} rows", rows.len());
    let path = export_json(&ops.output_dir, name, rows)?;
    println!("Saved to {}", path.display());
    Ok(())
}

async fn get_odoo(cli: &Cli) -> Result<Odoo> {
    let Some(file) = cli.key_file.clone() else {
        anyhow::bail!(
            "no key file given; set {} or pass --key-file",
            config::ENV_ACCESS_KEY
        );
    };
    let source = KeySource {
        conf_dir: cli.conf_dir.clone(),
        file,
        index: cli.key_index.unwrap_or(0),
        alias: cli.alias.clone(),
    };
    let key = source.resolve()?;
    Odoo::from_key(&key)
        .await
        .with_context(|| format!("login to {} as {}", key.host, key.username))
}

/// `--env-file PATH` or `--env-file=PATH`, scanned ahead of clap.
fn env_file_arg<I: IntoIterator<Item = String>>(args: I) -> Option<PathBuf> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--env-file" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--env-file=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    // The env file must be loaded before clap reads `env = ...` arguments.
    let env_file = env_file_arg(std::env::args())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));
    config::load_env(&env_file);

    let cli = Cli::parse();
    if cli.env_file != env_file {
        config::load_env(&cli.env_file);
    }
    init_tracing(cli.json_logs);

    let ops = OpsConfig {
        output_dir: cli.output_dir.clone(),
        relocate_delay: Duration::from_millis(cli.relocate_delay_ms),
        pricelist_delay: Duration::from_millis(cli.pricelist_delay_ms),
        dry_run: cli.dry_run,
    };
    let odoo = get_odoo(&cli).await?;

    match &cli.command {
        Command::Version => {
            let version = odoo.version().await?;
            println!("{}", version.server_version);
        }
        Command::Quants => {
            let rows = reports::quants_report(&odoo).await?;
            show(&rows, &ops, "quants_to_show")?;
        }
        Command::Products => {
            let rows = reports::products_report(&odoo).await?;
            show(&rows, &ops, "products_to_show")?;
        }
        Command::Sales { exclude_users } => {
            let report = reports::sales_report(&odoo, exclude_users).await?;
            show(&report.orders, &ops, "sale_orders")?;
            show(&report.lines, &ops, "sale_order_lines")?;
        }
        Command::Purchases { exclude_partners } => {
            let report = reports::purchase_report(&odoo, exclude_partners).await?;
            show(&report.orders, &ops, "purchase_orders")?;
            show(&report.lines, &ops, "purchase_order_lines")?;
        }
        Command::Templates { ids } => {
            let rows = reports::templates_report(&odoo, ids).await?;
            show(&rows, &ops, "product_templates")?;
        }
        Command::Relocate => {
            let moves = putaway::find_stock_to_move(&odoo).await?;
            if moves.is_empty() {
                println!("No quants to move!");
                return Ok(());
            }
            show(&moves, &ops, "stock_to_move")?;
            if !confirm("Relocate these quants?", cli.yes)? {
                println!("Aborted");
                return Ok(());
            }
            let done = putaway::relocate(&odoo, &moves, ops.relocate_delay, ops.dry_run).await?;
            info!(relocated = done, "relocation finished");
        }
        Command::PricelistSync { vip_file } => {
            let rows = pricelist::load_vip_prices(vip_file)?;
            let lines = pricelist::prepare_vip_lines(rows);
            let groups = pricelist::group_names(&lines);
            println!("VIP groups: {}", groups.len());
            for (i, name) in groups.iter().enumerate() {
                println!("{}. {}", i + 1, name);
            }

            let sync = PricelistSync::new(&odoo, ops.pricelist_delay, ops.dry_run);
            let plan = sync.plan(&lines).await?;
            println!("Pricelists in Odoo: {}", plan.pricelists.len());
            println!("Pricelists not in Odoo: {}", plan.missing_pricelists.len());
            for (i, name) in plan.missing_pricelists.iter().enumerate() {
                println!("\t{}. {}", i + 1, name);
            }
            show(&plan.rows, &ops, "vip_odoo_pricelist_items")?;

            let prompt = format!(
                "Write {} updates and {} creations to Odoo?",
                plan.updates().count(),
                plan.creates().count()
            );
            if !confirm(&prompt, cli.yes)? {
                println!("Cancelled");
                return Ok(());
            }
            let outcome = sync.apply(&plan).await?;
            println!(
                "Updated {}, created {}, products not found: {}",
                outcome.updated,
                outcome.created,
                outcome.not_found.len()
            );
            for reference in &outcome.not_found {
                println!("\t{}", reference);
            }
        }
    }
    Ok(())
}
