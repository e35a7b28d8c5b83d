use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use farm_equipment_sharing::{
    import_csv_file, logging, open_store, Config, ContractValue, DynStore, EquipmentContract,
    EquipmentRegistry, NewEquipment, Principal,
};

#[derive(Parser)]
#[command(name = "farm-equipment", about = "Shared farm equipment registry")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register one piece of equipment
    Register {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        daily_rate: u64,
        #[arg(long)]
        deposit: u64,
        #[arg(long)]
        location: String,
    },
    /// Show one record by id
    Get { id: u64 },
    /// Show all records
    List,
    /// Show the audit trail of one record
    Events { id: u64 },
    /// Register every row of a CSV file
    Import {
        csv: PathBuf,
        #[arg(long)]
        caller: String,
    },
    /// Call a contract method with literal arguments (u100, "text", -5)
    Call {
        method: String,
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
        #[arg(long)]
        caller: String,
        /// Use a read-only call
        #[arg(long)]
        read_only: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db.clone() {
        config.db_path = Some(db);
    }

    logging::init_tracing(&config.log_level, cli.verbose);

    let mut registry = EquipmentRegistry::with_store(open_store(config.db_path.as_deref())?);

    match cli.command {
        Commands::Register {
            caller,
            name,
            category,
            daily_rate,
            deposit,
            location,
        } => {
            let params = NewEquipment::new(name, category, daily_rate, deposit, location);
            let id = registry.register(params, &Principal::new(caller))?;
            println!("✓ Registered equipment #{}", id);
        }
        Commands::Get { id } => match registry.get_equipment(id)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("Equipment #{} not found", id),
        },
        Commands::List => {
            let records = registry.all_equipment()?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            println!("✓ {} records", records.len());
        }
        Commands::Events { id } => {
            let events = registry.equipment_events(id)?;
            println!("{}", serde_json::to_string_pretty(&events)?);
            println!("✓ {} events", events.len());
        }
        Commands::Import { csv, caller } => run_import(&mut registry, &csv, &Principal::new(caller))?,
        Commands::Call {
            method,
            args,
            caller,
            read_only,
        } => {
            let args = ContractValue::parse_args(&args)?;
            let caller = Principal::new(caller);
            let mut contract = EquipmentContract::new(registry);

            let result = if read_only {
                contract.call_read_only(&method, &args, &caller)?
            } else {
                contract.call_public(&method, &args, &caller)?
            };
            println!("{}", result);
        }
    }

    Ok(())
}

fn run_import(
    registry: &mut EquipmentRegistry<DynStore>,
    csv: &std::path::Path,
    caller: &Principal,
) -> Result<()> {
    println!("📂 Importing equipment from {}", csv.display());

    let summary = import_csv_file(registry, csv, caller)
        .with_context(|| format!("Import of {} failed", csv.display()))?;

    println!("✓ Registered: {} records", summary.registered.len());
    for rejected in &summary.rejected {
        eprintln!("✗ line {}: {}", rejected.line, rejected.reason);
    }

    if summary.registered.is_empty() && !summary.rejected.is_empty() {
        bail!("no rows imported");
    }

    Ok(())
}
