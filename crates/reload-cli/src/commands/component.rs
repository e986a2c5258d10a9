use reload_core::storage::{
    ComponentFilter, ComponentKind, ComponentPatch, InventoryStore, NewComponent,
};
use reload_core::units::WeightUnit;
use reload_core::ReloadError;

use crate::app::AppContext;
use crate::cli::{ComponentAddArgs, ComponentCommand};
use crate::helpers::{parse_arg, parse_id};
use crate::output::{print_component, print_components, print_json};

pub fn handle_component(ctx: &AppContext, command: &ComponentCommand) -> anyhow::Result<()> {
    match command {
        ComponentCommand::Add(args) => handle_add(ctx, args),
        ComponentCommand::List { kind, low_stock } => {
            let ledger = ctx.open_ledger()?;
            let mut filter = ComponentFilter::new();
            if let Some(kind) = kind {
                filter = filter.kind(parse_arg::<ComponentKind>(kind)?);
            }
            if *low_stock {
                filter = filter.low_stock_only();
            }
            let components = ledger.store().list_components(ledger.owner(), &filter)?;
            print_components(ctx, &components)
        }
        ComponentCommand::Show { id } => {
            let ledger = ctx.open_ledger()?;
            let id = parse_id(id, "component")?;
            let component = ledger
                .store()
                .get_component(ledger.owner(), &id)?
                .ok_or_else(|| ReloadError::NotFound(format!("component {}", id)))?;
            print_component(ctx, &component)
        }
        ComponentCommand::Edit {
            id,
            manufacturer,
            model,
            caliber,
            low_stock,
        } => {
            let ledger = ctx.open_ledger()?;
            let id = parse_id(id, "component")?;
            let patch = ComponentPatch {
                manufacturer: manufacturer.clone(),
                model: model.clone(),
                caliber: caliber.clone().map(Some),
                low_stock_threshold: low_stock.map(Some),
            };
            let component = ledger.store().update_component(ledger.owner(), &id, &patch)?;
            if ctx.json() {
                return print_json(&component);
            }
            if !ctx.quiet() {
                println!("Updated {} {}", component.kind, component.display_name());
            }
            Ok(())
        }
        ComponentCommand::Delete { id } => {
            let ledger = ctx.open_ledger()?;
            let id = parse_id(id, "component")?;
            ledger.delete_component(&id)?;
            if ctx.json() {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            if !ctx.quiet() {
                println!("Deleted component {}", id);
            }
            Ok(())
        }
    }
}

fn handle_add(ctx: &AppContext, args: &ComponentAddArgs) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    let kind: ComponentKind = parse_arg(&args.kind)?;

    let mut component = NewComponent::new(
        ledger.owner(),
        kind,
        args.manufacturer.as_str(),
        args.model.as_str(),
        args.quantity,
    );
    if let Some(unit) = args.unit.as_deref() {
        component = component.with_weight_unit(parse_arg::<WeightUnit>(unit)?);
    }
    if let Some(price) = args.price {
        if !price.is_finite() || price < 0.0 {
            return Err(anyhow::anyhow!("Price must be zero or more"));
        }
        component = component.with_purchase_price(price);
    }
    if let Some(caliber) = args.caliber.as_deref() {
        component = component.with_caliber(caliber);
    }
    if let Some(threshold) = args.low_stock {
        component = component.with_low_stock_threshold(threshold);
    }

    let created = ledger.add_component(component)?;
    if ctx.json() {
        return print_json(&created);
    }
    if !ctx.quiet() {
        println!("Added {} {} ({})", created.kind, created.display_name(), created.id);
    }
    Ok(())
}
