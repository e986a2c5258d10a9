use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use reload_core::VERSION;

/// Reload - inventory ledger for ammunition reloading
#[derive(Parser)]
#[command(name = "reload")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store file
    #[arg(short, long, global = true, env = "RELOAD_STORE")]
    pub store: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a store and write the config file
    Init(InitArgs),

    /// Manage component lots (primers, powder, bullets, brass)
    #[command(subcommand)]
    Component(ComponentCommand),

    /// Manage firearms
    #[command(subcommand)]
    Firearm(FirearmCommand),

    /// Produce, edit and delete ammunition batches
    #[command(subcommand)]
    Batch(BatchCommand),

    /// Log and reverse shooting sessions
    #[command(subcommand)]
    Session(SessionCommand),

    /// Firearm maintenance schedules
    #[command(subcommand)]
    Maintenance(MaintenanceCommand),

    /// Scan for dangling references and low stock
    Check,

    /// Write a consistent copy of the store
    Backup(BackupArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the store will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Owner name recorded on every row
    #[arg(long, default_value = "local")]
    pub owner: String,

    /// Account tier (free, pro)
    #[arg(long, default_value = "free")]
    pub tier: String,

    /// Shortage policy for production runs (clamp, reject)
    #[arg(long, default_value = "clamp")]
    pub shortage: String,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand)]
pub enum ComponentCommand {
    /// Add a component lot
    Add(ComponentAddArgs),

    /// List component lots
    List {
        /// Filter by kind (primer, powder, bullet, brass)
        #[arg(long)]
        kind: Option<String>,

        /// Only lots at or below their low-stock threshold
        #[arg(long)]
        low_stock: bool,
    },

    /// Show a component lot
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Edit descriptive fields of a component lot
    Edit {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(long)]
        manufacturer: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        caliber: Option<String>,

        #[arg(long)]
        low_stock: Option<f64>,
    },

    /// Delete a component lot (batches keep their reference)
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Args)]
pub struct ComponentAddArgs {
    /// Kind (primer, powder, bullet, brass)
    #[arg(value_name = "KIND")]
    pub kind: String,

    #[arg(value_name = "MANUFACTURER")]
    pub manufacturer: String,

    #[arg(value_name = "MODEL")]
    pub model: String,

    /// Pieces, or mass in --unit for powder
    #[arg(long)]
    pub quantity: f64,

    /// Weight unit for powder (lb, g)
    #[arg(long)]
    pub unit: Option<String>,

    /// Total price paid for the lot
    #[arg(long)]
    pub price: Option<f64>,

    #[arg(long)]
    pub caliber: Option<String>,

    /// Flag the lot as low at or below this quantity
    #[arg(long)]
    pub low_stock: Option<f64>,
}

#[derive(Subcommand)]
pub enum FirearmCommand {
    /// Add a firearm
    Add {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(long)]
        caliber: Option<String>,

        /// Rounds fired before tracking started
        #[arg(long, default_value_t = 0)]
        round_count: u64,
    },

    /// List firearms
    List,

    /// Show a firearm with its maintenance status
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete a firearm and its maintenance tasks
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BatchCommand {
    /// Produce a batch (handload by default)
    Produce(ProduceArgs),

    /// List batches
    List {
        /// Filter by type (handload, factory)
        #[arg(long = "type")]
        ammunition_type: Option<String>,

        #[arg(long)]
        caliber: Option<String>,

        /// Only batches with rounds remaining
        #[arg(long)]
        available: bool,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a batch
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Edit a batch
    Edit(BatchEditArgs),

    /// Delete a batch
    Delete {
        #[arg(value_name = "ID")]
        id: String,

        /// Return the batch's components to stock
        #[arg(long)]
        return_components: bool,
    },
}

#[derive(Args)]
pub struct ProduceArgs {
    #[arg(value_name = "BATCH_NUMBER")]
    pub batch_number: String,

    /// Rounds in the batch
    #[arg(value_name = "QUANTITY")]
    pub quantity: u32,

    /// Factory ammunition (no components consumed)
    #[arg(long, conflicts_with_all = ["primer", "powder", "bullet", "brass"])]
    pub factory: bool,

    /// Purchase price for factory ammunition
    #[arg(long, requires = "factory")]
    pub cost: Option<f64>,

    #[arg(long)]
    pub primer: Option<String>,

    #[arg(long)]
    pub powder: Option<String>,

    /// Powder charge per round in grains; without it powder stock is untouched
    #[arg(long)]
    pub charge: Option<f64>,

    #[arg(long)]
    pub bullet: Option<String>,

    #[arg(long)]
    pub brass: Option<String>,

    #[arg(long)]
    pub caliber: Option<String>,

    /// Cartridge overall length
    #[arg(long)]
    pub coal: Option<f64>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct BatchEditArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long)]
    pub batch_number: Option<String>,

    #[arg(long)]
    pub caliber: Option<String>,

    #[arg(long)]
    pub coal: Option<f64>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub quantity: Option<u32>,

    /// Total cost of the batch
    #[arg(long)]
    pub cost: Option<f64>,

    /// Consume or return components for a quantity change
    #[arg(long)]
    pub adjust_stock: bool,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Log a shooting session
    Fire(FireArgs),

    /// List sessions, newest first
    List {
        #[arg(long)]
        firearm: Option<String>,

        #[arg(long)]
        batch: Option<String>,

        /// Start date (ISO-8601 or YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// End date (ISO-8601 or YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a session with its shots
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete a session
    Delete {
        #[arg(value_name = "ID")]
        id: String,

        /// Put the rounds back on the batch and take them off the firearm
        #[arg(long)]
        return_rounds: bool,
    },
}

#[derive(Args)]
pub struct FireArgs {
    /// Firearm ID
    #[arg(value_name = "FIREARM")]
    pub firearm: String,

    #[arg(value_name = "ROUNDS")]
    pub rounds: u32,

    /// Batch the rounds came from
    #[arg(long)]
    pub batch: Option<String>,

    /// Session date (ISO-8601 or YYYY-MM-DD, defaults to now)
    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    /// Temperature in Fahrenheit
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Relative humidity in percent
    #[arg(long)]
    pub humidity: Option<f64>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Chronograph velocities in fps, one per shot in order
    #[arg(long = "velocity", value_name = "FPS", value_delimiter = ',')]
    pub velocities: Vec<f64>,

    /// Shot numbers that showed a flattened primer
    #[arg(long, value_name = "SHOT", value_delimiter = ',')]
    pub flattened: Vec<u32>,

    /// Shot numbers that showed a cratered primer
    #[arg(long, value_name = "SHOT", value_delimiter = ',')]
    pub cratered: Vec<u32>,

    /// Shot numbers that left an ejector mark
    #[arg(long, value_name = "SHOT", value_delimiter = ',')]
    pub ejector_mark: Vec<u32>,

    /// Shot numbers with a sticky bolt lift
    #[arg(long, value_name = "SHOT", value_delimiter = ',')]
    pub sticky_bolt: Vec<u32>,
}

#[derive(Subcommand)]
pub enum MaintenanceCommand {
    /// Add a recurring maintenance task to a firearm
    Add {
        #[arg(value_name = "FIREARM")]
        firearm: String,

        #[arg(value_name = "NAME")]
        name: String,

        /// Due after this many rounds
        #[arg(long)]
        every_rounds: Option<u64>,

        /// Due after this many days
        #[arg(long)]
        every_days: Option<u32>,
    },

    /// Show maintenance status for a firearm
    List {
        #[arg(value_name = "FIREARM")]
        firearm: String,
    },

    /// Mark a task as performed now
    Done {
        #[arg(value_name = "TASK")]
        task: String,
    },
}

/// Arguments for the `backup` command
#[derive(Args)]
pub struct BackupArgs {
    /// Destination file
    #[arg(value_name = "DEST")]
    pub destination: String,
}
