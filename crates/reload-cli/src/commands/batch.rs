use reload_core::storage::{AmmunitionType, BatchFilter, InventoryStore};
use reload_core::{BatchEdit, NewBatchRequest, ReloadError};

use crate::app::AppContext;
use crate::cli::{BatchCommand, BatchEditArgs, ProduceArgs};
use crate::helpers::{parse_arg, parse_id, parse_optional_id};
use crate::output::{fmt_money, print_batch, print_batches, print_json, print_warnings};

pub fn handle_batch(ctx: &AppContext, command: &BatchCommand) -> anyhow::Result<()> {
    match command {
        BatchCommand::Produce(args) => handle_produce(ctx, args),
        BatchCommand::List {
            ammunition_type,
            caliber,
            available,
            limit,
        } => {
            let ledger = ctx.open_ledger()?;
            let mut filter = BatchFilter::new();
            if let Some(value) = ammunition_type {
                filter = filter.ammunition_type(parse_arg::<AmmunitionType>(value)?);
            }
            if let Some(caliber) = caliber {
                filter = filter.caliber(caliber.as_str());
            }
            if *available {
                filter = filter.available_only();
            }
            if let Some(limit) = limit {
                filter = filter.limit(*limit);
            }
            let batches = ledger.store().list_batches(ledger.owner(), &filter)?;
            print_batches(ctx, &batches)
        }
        BatchCommand::Show { id } => {
            let ledger = ctx.open_ledger()?;
            let id = parse_id(id, "batch")?;
            let batch = ledger
                .store()
                .get_batch(ledger.owner(), &id)?
                .ok_or_else(|| ReloadError::NotFound(format!("batch {}", id)))?;
            print_batch(ctx, &batch)
        }
        BatchCommand::Edit(args) => handle_edit(ctx, args),
        BatchCommand::Delete {
            id,
            return_components,
        } => {
            let ledger = ctx.open_ledger()?;
            let id = parse_id(id, "batch")?;
            let outcome = ledger.delete_batch(&id, *return_components)?;
            if ctx.json() {
                return print_json(&outcome);
            }
            print_warnings(&outcome.warnings);
            if !ctx.quiet() {
                let returned = if *return_components {
                    " and returned its components"
                } else {
                    ""
                };
                println!("Deleted batch {}{}", outcome.value.batch_number, returned);
            }
            Ok(())
        }
    }
}

fn handle_produce(ctx: &AppContext, args: &ProduceArgs) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;

    let mut request = if args.factory {
        NewBatchRequest::factory(args.batch_number.as_str(), args.quantity, args.cost)
    } else {
        let mut request = NewBatchRequest::handload(args.batch_number.as_str(), args.quantity);
        if let Some(id) = parse_optional_id(args.primer.as_deref(), "primer")? {
            request = request.with_primer(id);
        }
        request.components.powder = parse_optional_id(args.powder.as_deref(), "powder")?;
        request.charge_weight_grains = args.charge;
        if let Some(id) = parse_optional_id(args.bullet.as_deref(), "bullet")? {
            request = request.with_bullet(id);
        }
        if let Some(id) = parse_optional_id(args.brass.as_deref(), "brass")? {
            request = request.with_brass(id);
        }
        request
    };
    if let Some(caliber) = args.caliber.as_deref() {
        request = request.with_caliber(caliber);
    }
    if let Some(coal) = args.coal {
        request = request.with_coal(coal);
    }
    if let Some(notes) = args.notes.as_deref() {
        request = request.with_notes(notes);
    }

    let outcome = ledger.produce_batch(request)?;
    if ctx.json() {
        return print_json(&outcome);
    }
    print_warnings(&outcome.warnings);
    if !ctx.quiet() {
        let batch = &outcome.value;
        println!(
            "Produced batch {} ({} rounds, {} per round) {}",
            batch.batch_number,
            batch.quantity,
            fmt_money(batch.cost_per_round),
            batch.id
        );
    }
    Ok(())
}

fn handle_edit(ctx: &AppContext, args: &BatchEditArgs) -> anyhow::Result<()> {
    let edit = BatchEdit {
        batch_number: args.batch_number.clone(),
        caliber: args.caliber.clone(),
        coal: args.coal,
        notes: args.notes.clone(),
        quantity: args.quantity,
        total_cost: args.cost,
    };
    if edit.batch_number.is_none()
        && edit.caliber.is_none()
        && edit.coal.is_none()
        && edit.notes.is_none()
        && edit.quantity.is_none()
        && edit.total_cost.is_none()
    {
        return Err(anyhow::anyhow!("Nothing to edit"));
    }

    let ledger = ctx.open_ledger()?;
    let id = parse_id(&args.id, "batch")?;
    let outcome = ledger.edit_batch(&id, edit, args.adjust_stock)?;
    if ctx.json() {
        return print_json(&outcome);
    }
    print_warnings(&outcome.warnings);
    if !ctx.quiet() {
        let batch = &outcome.value;
        println!(
            "Updated batch {} ({}/{} remaining, {} per round)",
            batch.batch_number,
            batch.quantity_remaining,
            batch.quantity,
            fmt_money(batch.cost_per_round)
        );
    }
    Ok(())
}
