use reload_core::storage::{Conditions, InventoryStore, NewShot, PressureSigns, SessionFilter};
use reload_core::NewSessionRequest;

use crate::app::AppContext;
use crate::cli::{FireArgs, SessionCommand};
use crate::helpers::{parse_datetime, parse_id, parse_optional_id};
use crate::output::{print_json, print_session, print_sessions, print_warnings};

pub fn handle_session(ctx: &AppContext, command: &SessionCommand) -> anyhow::Result<()> {
    match command {
        SessionCommand::Fire(args) => handle_fire(ctx, args),
        SessionCommand::List {
            firearm,
            batch,
            since,
            until,
            limit,
        } => {
            let ledger = ctx.open_ledger()?;
            let mut filter = SessionFilter::new();
            if let Some(id) = parse_optional_id(firearm.as_deref(), "firearm")? {
                filter = filter.firearm(id);
            }
            if let Some(id) = parse_optional_id(batch.as_deref(), "batch")? {
                filter = filter.batch(id);
            }
            if let Some(since) = since {
                filter = filter.since(parse_datetime(since)?);
            }
            if let Some(until) = until {
                filter = filter.until(parse_datetime(until)?);
            }
            if let Some(limit) = limit {
                filter = filter.limit(*limit);
            }
            let sessions = ledger.store().list_sessions(ledger.owner(), &filter)?;
            print_sessions(ctx, &sessions)
        }
        SessionCommand::Show { id } => {
            let ledger = ctx.open_ledger()?;
            let id = parse_id(id, "session")?;
            let record = ledger.session_record(&id)?;
            print_session(ctx, &record)
        }
        SessionCommand::Delete { id, return_rounds } => {
            let ledger = ctx.open_ledger()?;
            let id = parse_id(id, "session")?;
            let outcome = ledger.delete_session(&id, *return_rounds)?;
            if ctx.json() {
                return print_json(&outcome);
            }
            print_warnings(&outcome.warnings);
            if !ctx.quiet() {
                let returned = if *return_rounds {
                    format!(" and returned {} rounds", outcome.value.rounds_fired)
                } else {
                    String::new()
                };
                println!("Deleted session {}{}", id, returned);
            }
            Ok(())
        }
    }
}

fn handle_fire(ctx: &AppContext, args: &FireArgs) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    let firearm_id = parse_id(&args.firearm, "firearm")?;

    let shots = build_shots(args)?;

    let mut request = NewSessionRequest::new(firearm_id, args.rounds)
        .with_conditions(Conditions {
            location: args.location.clone(),
            temperature_f: args.temperature,
            humidity_pct: args.humidity,
            notes: args.notes.clone(),
        })
        .with_shots(shots);
    if let Some(batch_id) = parse_optional_id(args.batch.as_deref(), "batch")? {
        request = request.with_batch(batch_id);
    }
    if let Some(date) = args.date.as_deref() {
        request = request.with_date(parse_datetime(date)?);
    }

    let outcome = ledger.fire_session(request)?;
    if ctx.json() {
        return print_json(&outcome);
    }
    print_warnings(&outcome.warnings);
    if !ctx.quiet() {
        let session = &outcome.value.session;
        println!(
            "Logged session {} ({} rounds, {} shots recorded)",
            session.id,
            session.rounds_fired,
            outcome.value.shots.len()
        );
    }
    Ok(())
}

/// Number the clocked shots and attach any pressure signs flagged for them.
fn build_shots(args: &FireArgs) -> anyhow::Result<Vec<NewShot>> {
    let count = args.velocities.len();
    let flagged = [
        ("--flattened", &args.flattened),
        ("--cratered", &args.cratered),
        ("--ejector-mark", &args.ejector_mark),
        ("--sticky-bolt", &args.sticky_bolt),
    ];
    for (flag, numbers) in flagged {
        if let Some(bad) = numbers
            .iter()
            .find(|n| **n == 0 || usize::try_from(**n).map_or(true, |n| n > count))
        {
            return Err(anyhow::anyhow!(
                "{} {}: only shots 1..={} have a --velocity",
                flag,
                bad,
                count
            ));
        }
    }

    args.velocities
        .iter()
        .enumerate()
        .map(|(index, velocity)| {
            let number = u32::try_from(index + 1).map_err(|_| anyhow::anyhow!("Too many shots"))?;
            let pressure = PressureSigns {
                flattened_primer: args.flattened.contains(&number),
                cratered_primer: args.cratered.contains(&number),
                ejector_mark: args.ejector_mark.contains(&number),
                sticky_bolt: args.sticky_bolt.contains(&number),
            };
            Ok(NewShot::new(number, Some(*velocity)).with_pressure(pressure))
        })
        .collect()
}
