use chrono::Utc;

use reload_core::storage::{InventoryStore, NewFirearm};

use crate::app::AppContext;
use crate::cli::FirearmCommand;
use crate::helpers::parse_id;
use crate::output::{print_firearm, print_firearms, print_json};

pub fn handle_firearm(ctx: &AppContext, command: &FirearmCommand) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    match command {
        FirearmCommand::Add {
            name,
            caliber,
            round_count,
        } => {
            if name.trim().is_empty() {
                return Err(anyhow::anyhow!("Firearm name cannot be empty"));
            }
            let mut firearm =
                NewFirearm::new(ledger.owner(), name.trim()).with_round_count(*round_count);
            if let Some(caliber) = caliber.as_deref() {
                firearm = firearm.with_caliber(caliber);
            }
            let created = ledger.add_firearm(firearm)?;
            if ctx.json() {
                return print_json(&created);
            }
            if !ctx.quiet() {
                println!("Added firearm {} ({})", created.name, created.id);
            }
            Ok(())
        }
        FirearmCommand::List => {
            let firearms = ledger.store().list_firearms(ledger.owner())?;
            print_firearms(ctx, &firearms)
        }
        FirearmCommand::Show { id } => {
            let id = parse_id(id, "firearm")?;
            let (firearm, maintenance) = ledger.maintenance_report(&id, Utc::now())?;
            print_firearm(ctx, &firearm, &maintenance)
        }
        FirearmCommand::Delete { id } => {
            let id = parse_id(id, "firearm")?;
            ledger.delete_firearm(&id)?;
            if ctx.json() {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            if !ctx.quiet() {
                println!("Deleted firearm {}", id);
            }
            Ok(())
        }
    }
}
