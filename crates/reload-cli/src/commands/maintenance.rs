use chrono::Utc;

use reload_core::storage::NewMaintenanceTask;

use crate::app::AppContext;
use crate::cli::MaintenanceCommand;
use crate::helpers::parse_id;
use crate::output::{print_json, print_maintenance};

pub fn handle_maintenance(ctx: &AppContext, command: &MaintenanceCommand) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    match command {
        MaintenanceCommand::Add {
            firearm,
            name,
            every_rounds,
            every_days,
        } => {
            if every_rounds.is_none() && every_days.is_none() {
                return Err(anyhow::anyhow!(
                    "A task needs --every-rounds, --every-days, or both"
                ));
            }
            let task = ledger.add_maintenance_task(NewMaintenanceTask {
                firearm_id: parse_id(firearm, "firearm")?,
                name: name.trim().to_string(),
                interval_rounds: *every_rounds,
                interval_days: *every_days,
            })?;
            if ctx.json() {
                return print_json(&task);
            }
            if !ctx.quiet() {
                println!("Added maintenance task {} ({})", task.name, task.id);
            }
            Ok(())
        }
        MaintenanceCommand::List { firearm } => {
            let firearm_id = parse_id(firearm, "firearm")?;
            let (_, items) = ledger.maintenance_report(&firearm_id, Utc::now())?;
            print_maintenance(ctx, &items)
        }
        MaintenanceCommand::Done { task } => {
            let task_id = parse_id(task, "task")?;
            let task = ledger.complete_maintenance(&task_id)?;
            if ctx.json() {
                return print_json(&task);
            }
            if !ctx.quiet() {
                println!(
                    "Marked {} done at {} rounds",
                    task.name, task.last_round_count
                );
            }
            Ok(())
        }
    }
}
