//! Output formatting helpers for the CLI.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

use reload_core::audit::Finding;
use reload_core::maintenance::MaintenanceItem;
use reload_core::storage::{AmmunitionBatch, Component, Firearm, ShootingSession};
use reload_core::{SessionRecord, Warning};

use crate::app::AppContext;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Secondary effects that did not apply go to stderr.
pub fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
}

pub fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.to_vec());
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

/// Quantity with trailing zeros trimmed.
pub fn fmt_amount(value: f64) -> String {
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

pub fn fmt_money(value: Option<f64>) -> String {
    match value {
        Some(amount) if amount.abs() < 1.0 && amount != 0.0 => format!("${:.3}", amount),
        Some(amount) => format!("${:.2}", amount),
        None => "-".to_string(),
    }
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn component_quantity(component: &Component) -> String {
    match component.weight_unit {
        Some(unit) => format!("{} {}", fmt_amount(component.quantity), unit),
        None => fmt_amount(component.quantity),
    }
}

pub fn print_components(ctx: &AppContext, components: &[Component]) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&components);
    }
    if components.is_empty() {
        if !ctx.quiet() {
            println!("No components.");
        }
        return Ok(());
    }
    let rows = components
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.kind.to_string(),
                c.display_name(),
                component_quantity(c),
                fmt_money(c.cost_per_unit),
                if c.is_low_stock() { "low".to_string() } else { String::new() },
            ]
        })
        .collect();
    println!(
        "{}",
        table(&["ID", "Kind", "Name", "Quantity", "Unit cost", ""], rows)
    );
    Ok(())
}

pub fn print_component(ctx: &AppContext, component: &Component) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(component);
    }
    println!("ID: {}", component.id);
    println!("Kind: {}", component.kind);
    println!("Name: {}", component.display_name());
    println!("Quantity: {}", component_quantity(component));
    println!("Unit cost: {}", fmt_money(component.cost_per_unit));
    println!("Caliber: {}", or_dash(component.caliber.as_deref()));
    if let Some(threshold) = component.low_stock_threshold {
        let flag = if component.is_low_stock() { " (low)" } else { "" };
        println!("Low stock at: {}{}", fmt_amount(threshold), flag);
    }
    println!("Created: {}", component.created_at);
    Ok(())
}

pub fn print_firearms(ctx: &AppContext, firearms: &[Firearm]) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&firearms);
    }
    if firearms.is_empty() {
        if !ctx.quiet() {
            println!("No firearms.");
        }
        return Ok(());
    }
    let rows = firearms
        .iter()
        .map(|f| {
            vec![
                f.id.to_string(),
                f.name.clone(),
                or_dash(f.caliber.as_deref()),
                f.round_count.to_string(),
            ]
        })
        .collect();
    println!("{}", table(&["ID", "Name", "Caliber", "Rounds"], rows));
    Ok(())
}

pub fn print_firearm(
    ctx: &AppContext,
    firearm: &Firearm,
    maintenance: &[MaintenanceItem],
) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&serde_json::json!({
            "firearm": firearm,
            "maintenance": maintenance,
        }));
    }
    println!("ID: {}", firearm.id);
    println!("Name: {}", firearm.name);
    println!("Caliber: {}", or_dash(firearm.caliber.as_deref()));
    println!("Round count: {}", firearm.round_count);
    if !maintenance.is_empty() {
        println!();
        print_maintenance_table(maintenance);
    }
    Ok(())
}

pub fn print_maintenance(ctx: &AppContext, items: &[MaintenanceItem]) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&items);
    }
    if items.is_empty() {
        if !ctx.quiet() {
            println!("No maintenance tasks.");
        }
        return Ok(());
    }
    print_maintenance_table(items);
    Ok(())
}

fn print_maintenance_table(items: &[MaintenanceItem]) {
    let rows = items
        .iter()
        .map(|item| {
            let every = match (item.task.interval_rounds, item.task.interval_days) {
                (Some(rounds), Some(days)) => format!("{} rds / {} d", rounds, days),
                (Some(rounds), None) => format!("{} rds", rounds),
                (None, Some(days)) => format!("{} d", days),
                (None, None) => "-".to_string(),
            };
            vec![
                item.task.id.to_string(),
                item.task.name.clone(),
                every,
                item.rounds_since.to_string(),
                item.task.last_performed.format("%Y-%m-%d").to_string(),
                item.status.as_str().to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        table(
            &["ID", "Task", "Every", "Rounds since", "Last done", "Status"],
            rows
        )
    );
}

pub fn print_batches(ctx: &AppContext, batches: &[AmmunitionBatch]) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&batches);
    }
    if batches.is_empty() {
        if !ctx.quiet() {
            println!("No batches.");
        }
        return Ok(());
    }
    let rows = batches
        .iter()
        .map(|b| {
            vec![
                b.id.to_string(),
                b.batch_number.clone(),
                b.ammunition_type.to_string(),
                or_dash(b.caliber.as_deref()),
                format!("{}/{}", b.quantity_remaining, b.quantity),
                fmt_money(b.cost_per_round),
            ]
        })
        .collect();
    println!(
        "{}",
        table(
            &["ID", "Batch", "Type", "Caliber", "Remaining", "Per round"],
            rows
        )
    );
    Ok(())
}

pub fn print_batch(ctx: &AppContext, batch: &AmmunitionBatch) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(batch);
    }
    println!("ID: {}", batch.id);
    println!("Batch: {} ({})", batch.batch_number, batch.ammunition_type);
    println!("Caliber: {}", or_dash(batch.caliber.as_deref()));
    println!("Remaining: {} of {}", batch.quantity_remaining, batch.quantity);
    for (kind, id) in batch.components.iter() {
        println!("{}: {}", capitalize(kind.as_str()), id);
    }
    if let Some(charge) = batch.charge_weight_grains {
        println!("Charge: {} gr", fmt_amount(charge));
    }
    if let Some(coal) = batch.coal {
        println!("COAL: {}", coal);
    }
    println!("Total cost: {}", fmt_money(batch.total_cost));
    println!("Per round: {}", fmt_money(batch.cost_per_round));
    if let Some(notes) = batch.notes.as_deref() {
        println!("Notes: {}", notes);
    }
    println!("Created: {}", batch.created_at);
    Ok(())
}

pub fn print_sessions(ctx: &AppContext, sessions: &[ShootingSession]) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&sessions);
    }
    if sessions.is_empty() {
        if !ctx.quiet() {
            println!("No sessions.");
        }
        return Ok(());
    }
    let rows = sessions
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.date.format("%Y-%m-%d").to_string(),
                s.firearm_id.to_string(),
                s.ammunition_batch_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                s.rounds_fired.to_string(),
                or_dash(s.conditions.location.as_deref()),
            ]
        })
        .collect();
    println!(
        "{}",
        table(
            &["ID", "Date", "Firearm", "Batch", "Rounds", "Location"],
            rows
        )
    );
    Ok(())
}

pub fn print_session(ctx: &AppContext, record: &SessionRecord) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(record);
    }
    let session = &record.session;
    println!("ID: {}", session.id);
    println!("Date: {}", session.date);
    println!("Firearm: {}", session.firearm_id);
    if let Some(batch) = session.ammunition_batch_id {
        println!("Batch: {}", batch);
    }
    println!("Rounds: {}", session.rounds_fired);
    if let Some(location) = session.conditions.location.as_deref() {
        println!("Location: {}", location);
    }
    if let Some(temperature) = session.conditions.temperature_f {
        println!("Temperature: {} F", temperature);
    }
    if let Some(humidity) = session.conditions.humidity_pct {
        println!("Humidity: {}%", humidity);
    }
    if let Some(notes) = session.conditions.notes.as_deref() {
        println!("Notes: {}", notes);
    }
    if !record.shots.is_empty() {
        let rows = record
            .shots
            .iter()
            .map(|shot| {
                vec![
                    shot.shot_number.to_string(),
                    shot.velocity_fps
                        .map(|v| format!("{:.0}", v))
                        .unwrap_or_else(|| "-".to_string()),
                    if shot.pressure.any() { "yes".to_string() } else { String::new() },
                ]
            })
            .collect();
        println!();
        println!("{}", table(&["Shot", "FPS", "Pressure"], rows));
    }
    Ok(())
}

pub fn print_findings(ctx: &AppContext, findings: &[Finding]) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&findings);
    }
    if findings.is_empty() {
        if !ctx.quiet() {
            println!("No issues found.");
        }
        return Ok(());
    }
    let rows = findings
        .iter()
        .map(|f| {
            vec![
                f.kind.as_str().to_string(),
                f.subject.to_string(),
                f.detail.clone(),
            ]
        })
        .collect();
    println!("{}", table(&["Finding", "Subject", "Detail"], rows));
    Ok(())
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
