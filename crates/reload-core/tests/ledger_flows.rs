mod common;

use std::thread;

use common::*;
use reload_core::quota::{LimitKind, QuotaTable, Tier, TierLimits};
use reload_core::storage::{Counter, InventoryStore, NewFirearm, NewShot, SessionFilter};
use reload_core::units::GRAINS_PER_POUND;
use reload_core::{BatchEdit, NewBatchRequest, NewSessionRequest, Policy, ReloadError, ShortagePolicy};

#[test]
fn test_primer_stock_drops_by_batch_size() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);

    let outcome = ledger
        .produce_batch(NewBatchRequest::handload("308-A", 50).with_primer(bench.primer.id))
        .unwrap();

    assert!(outcome.is_clean());
    assert_close(quantity(&ledger, &bench.primer.id), 450.0);
    assert_eq!(outcome.value.quantity_remaining, 50);
}

#[test]
fn test_powder_consumed_in_pounds_and_priced_per_grain() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);

    let batch = ledger
        .produce_batch(NewBatchRequest::handload("308-B", 20).with_powder(bench.powder.id, 42.5))
        .unwrap()
        .value;

    let used = 850.0 / GRAINS_PER_POUND;
    assert_close(quantity(&ledger, &bench.powder.id), 1.0 - used);
    let cost = batch.total_cost.unwrap();
    assert!((cost - 2.43).abs() < 0.005, "powder cost {cost}");
    assert_close(batch.cost_per_round.unwrap(), cost / 20.0);
}

#[test]
fn test_full_handload_cost_sums_priced_components() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);

    let batch = ledger
        .produce_batch(
            NewBatchRequest::handload("308-C", 20)
                .with_primer(bench.primer.id)
                .with_powder(bench.powder.id, 42.5)
                .with_bullet(bench.bullet.id)
                .with_brass(bench.brass.id)
                .with_caliber(".308 Win"),
        )
        .unwrap()
        .value;

    // primer 0.10 and bullet 0.40 per round, brass unpriced
    let powder = 20.0 / GRAINS_PER_POUND * 850.0;
    assert_close(batch.total_cost.unwrap(), 20.0 * 0.5 + powder);
    assert_close(quantity(&ledger, &bench.brass.id), 80.0);
    assert_close(quantity(&ledger, &bench.bullet.id), 180.0);
}

#[test]
fn test_session_over_remaining_rejected_before_any_write() {
    let ledger = sqlite_ledger(Policy::default());
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("FGMM", 30, Some(45.0)))
        .unwrap()
        .value;

    let err = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 35).with_batch(batch.id))
        .unwrap_err();

    assert!(matches!(
        err,
        ReloadError::InsufficientRounds {
            requested: 35,
            available: 30
        }
    ));
    assert_eq!(remaining(&ledger, &batch.id), 30);
    assert_eq!(round_count(&ledger, &firearm.id), 0);
    assert!(ledger
        .store()
        .list_sessions(OWNER, &SessionFilter::new())
        .unwrap()
        .is_empty());
}

#[test]
fn test_fire_and_return_rounds_restores_counts() {
    let ledger = sqlite_ledger(Policy::default());
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("FGMM", 10, None))
        .unwrap()
        .value;

    let record = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 10).with_batch(batch.id))
        .unwrap()
        .value;
    assert_eq!(remaining(&ledger, &batch.id), 0);
    assert_eq!(round_count(&ledger, &firearm.id), 10);

    let outcome = ledger.delete_session(&record.session.id, true).unwrap();
    assert!(outcome.is_clean());
    assert_eq!(remaining(&ledger, &batch.id), 10);
    assert_eq!(round_count(&ledger, &firearm.id), 0);
}

#[test]
fn test_returned_rounds_floor_firearm_count_at_zero() {
    let ledger = sqlite_ledger(Policy::default());
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Glock 19")).unwrap();
    let record = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 10))
        .unwrap()
        .value;
    ledger
        .store()
        .decrement_counter_with_floor(OWNER, Counter::FirearmRoundCount(firearm.id), 6)
        .unwrap();

    ledger.delete_session(&record.session.id, true).unwrap();
    assert_eq!(round_count(&ledger, &firearm.id), 0);
}

#[test]
fn test_clamp_policy_never_drives_stock_negative() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);

    let batch = ledger
        .produce_batch(
            NewBatchRequest::handload("big", 600)
                .with_primer(bench.primer.id)
                .with_powder(bench.powder.id, 45.0),
        )
        .unwrap()
        .value;

    assert_eq!(batch.quantity, 600);
    assert_eq!(quantity(&ledger, &bench.primer.id), 0.0);
    assert_eq!(quantity(&ledger, &bench.powder.id), 0.0);
}

#[test]
fn test_reject_policy_refuses_short_run_untouched() {
    let ledger = sqlite_ledger(Policy {
        shortage: ShortagePolicy::Reject,
        ..Policy::default()
    });
    let bench = stock_bench(&ledger);

    let err = ledger
        .produce_batch(
            NewBatchRequest::handload("big", 150)
                .with_primer(bench.primer.id)
                .with_brass(bench.brass.id),
        )
        .unwrap_err();

    match err {
        ReloadError::InsufficientStock { component, .. } => assert_eq!(component, bench.brass.id),
        other => panic!("unexpected error: {other}"),
    }
    assert_close(quantity(&ledger, &bench.primer.id), 500.0);
    assert_close(quantity(&ledger, &bench.brass.id), 100.0);
}

#[test]
fn test_batch_delete_returns_production_quantity_even_after_firing() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();

    let batch = ledger
        .produce_batch(
            NewBatchRequest::handload("308-D", 20)
                .with_primer(bench.primer.id)
                .with_powder(bench.powder.id, 42.5)
                .with_bullet(bench.bullet.id)
                .with_brass(bench.brass.id),
        )
        .unwrap()
        .value;
    ledger
        .fire_session(NewSessionRequest::new(firearm.id, 12).with_batch(batch.id))
        .unwrap();

    let outcome = ledger.delete_batch(&batch.id, true).unwrap();
    assert!(outcome.is_clean());
    assert_close(quantity(&ledger, &bench.primer.id), 500.0);
    assert_close(quantity(&ledger, &bench.powder.id), 1.0);
    assert_close(quantity(&ledger, &bench.bullet.id), 200.0);
    assert_close(quantity(&ledger, &bench.brass.id), 100.0);
    assert!(ledger.store().get_batch(OWNER, &batch.id).unwrap().is_none());
}

#[test]
fn test_batch_delete_without_return_keeps_stock() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);
    let batch = ledger
        .produce_batch(NewBatchRequest::handload("308-E", 40).with_primer(bench.primer.id))
        .unwrap()
        .value;

    ledger.delete_batch(&batch.id, false).unwrap();
    assert_close(quantity(&ledger, &bench.primer.id), 460.0);
}

#[test]
fn test_batch_delete_skips_deleted_component_with_warning() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);
    let batch = ledger
        .produce_batch(
            NewBatchRequest::handload("308-F", 10)
                .with_primer(bench.primer.id)
                .with_brass(bench.brass.id),
        )
        .unwrap()
        .value;
    ledger.delete_component(&bench.brass.id).unwrap();

    let outcome = ledger.delete_batch(&batch.id, true).unwrap();
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].message.contains(&bench.brass.id.to_string()));
    assert_close(quantity(&ledger, &bench.primer.id), 500.0);
}

#[test]
fn test_powder_return_uses_unit_recorded_on_batch() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);
    let batch = ledger
        .produce_batch(NewBatchRequest::handload("308-G", 50).with_powder(bench.powder.id, 44.0))
        .unwrap()
        .value;

    assert_eq!(batch.powder_weight_unit, Some(reload_core::units::WeightUnit::Lb));
    ledger.delete_batch(&batch.id, true).unwrap();
    assert_close(quantity(&ledger, &bench.powder.id), 1.0);
}

#[test]
fn test_cost_per_round_is_frozen_at_production() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);
    let first = ledger
        .produce_batch(NewBatchRequest::handload("A", 100).with_primer(bench.primer.id))
        .unwrap()
        .value;
    ledger
        .produce_batch(NewBatchRequest::handload("B", 100).with_primer(bench.primer.id))
        .unwrap();

    let edited = ledger
        .edit_batch(
            &first.id,
            BatchEdit {
                notes: Some("moly coated".to_string()),
                coal: Some(2.800),
                ..BatchEdit::default()
            },
            false,
        )
        .unwrap()
        .value;
    assert_eq!(edited.cost_per_round, first.cost_per_round);
    assert_eq!(edited.total_cost, first.total_cost);
    assert_close(first.cost_per_round.unwrap(), 0.1);
}

#[test]
fn test_edit_quantity_with_stock_adjustment() {
    let ledger = sqlite_ledger(Policy::default());
    let bench = stock_bench(&ledger);
    let batch = ledger
        .produce_batch(
            NewBatchRequest::handload("H", 50)
                .with_primer(bench.primer.id)
                .with_bullet(bench.bullet.id),
        )
        .unwrap()
        .value;

    let grown = ledger
        .edit_batch(
            &batch.id,
            BatchEdit {
                quantity: Some(60),
                ..BatchEdit::default()
            },
            true,
        )
        .unwrap();
    assert!(grown.is_clean());
    assert_eq!(grown.value.quantity_remaining, 60);
    assert_close(quantity(&ledger, &bench.primer.id), 440.0);

    let shrunk = ledger
        .edit_batch(
            &batch.id,
            BatchEdit {
                quantity: Some(30),
                ..BatchEdit::default()
            },
            true,
        )
        .unwrap()
        .value;
    assert_eq!(shrunk.quantity_remaining, 30);
    assert_close(quantity(&ledger, &bench.primer.id), 470.0);
    assert_close(quantity(&ledger, &bench.bullet.id), 170.0);
}

#[test]
fn test_returned_rounds_never_exceed_batch_quantity() {
    let ledger = sqlite_ledger(Policy::default());
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("F", 10, None))
        .unwrap()
        .value;
    let record = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 5).with_batch(batch.id))
        .unwrap()
        .value;
    ledger
        .edit_batch(
            &batch.id,
            BatchEdit {
                quantity: Some(7),
                ..BatchEdit::default()
            },
            false,
        )
        .unwrap();
    assert_eq!(remaining(&ledger, &batch.id), 2);

    ledger.delete_session(&record.session.id, true).unwrap();
    let batch = ledger.store().get_batch(OWNER, &batch.id).unwrap().unwrap();
    assert_eq!(batch.quantity_remaining, 7);
    assert!(batch.quantity_remaining <= batch.quantity);
}

#[test]
fn test_concurrent_sessions_cannot_overdraw_batch() {
    let ledger = sqlite_ledger(Policy {
        tier: Tier::Pro,
        ..Policy::default()
    });
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("F", 10, None))
        .unwrap()
        .value;

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    ledger.fire_session(NewSessionRequest::new(firearm.id, 10).with_batch(batch.id))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let fired = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(fired, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, ReloadError::InsufficientRounds { .. })));
    assert_eq!(remaining(&ledger, &batch.id), 0);
    assert_eq!(round_count(&ledger, &firearm.id), 10);
}

#[test]
fn test_quantity_edits_keep_concurrently_fired_rounds() {
    let ledger = sqlite_ledger(Policy {
        tier: Tier::Pro,
        ..Policy::default()
    });
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("F", 200, None))
        .unwrap()
        .value;

    thread::scope(|scope| {
        scope.spawn(|| {
            for step in 0..20 {
                let quantity = if step % 2 == 0 { 300 } else { 200 };
                ledger
                    .edit_batch(
                        &batch.id,
                        BatchEdit {
                            quantity: Some(quantity),
                            ..BatchEdit::default()
                        },
                        false,
                    )
                    .unwrap();
            }
        });
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..2 {
                    ledger
                        .fire_session(NewSessionRequest::new(firearm.id, 10).with_batch(batch.id))
                        .unwrap();
                }
            });
        }
    });

    let batch = ledger.store().get_batch(OWNER, &batch.id).unwrap().unwrap();
    assert_eq!(batch.quantity, 200);
    assert_eq!(batch.quantity_remaining, 120);
    assert_eq!(round_count(&ledger, &firearm.id), 80);
}

#[test]
fn test_free_tier_session_quota() {
    let ledger = sqlite_ledger(Policy {
        quotas: QuotaTable {
            free: TierLimits {
                sessions: Some(2),
                ..TierLimits::default()
            },
            ..QuotaTable::default()
        },
        ..Policy::default()
    });
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Glock 19")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("F", 100, None))
        .unwrap()
        .value;

    for _ in 0..2 {
        ledger
            .fire_session(NewSessionRequest::new(firearm.id, 5).with_batch(batch.id))
            .unwrap();
    }
    let err = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 5).with_batch(batch.id))
        .unwrap_err();

    assert!(matches!(
        err,
        ReloadError::QuotaExceeded {
            kind: LimitKind::Sessions,
            ceiling: 2
        }
    ));
    assert_eq!(remaining(&ledger, &batch.id), 90);
    assert_eq!(round_count(&ledger, &firearm.id), 10);
}

#[test]
fn test_batch_quota_checked_before_stock_moves() {
    let ledger = sqlite_ledger(Policy {
        quotas: QuotaTable {
            free: TierLimits {
                batches: Some(1),
                ..TierLimits::default()
            },
            ..QuotaTable::default()
        },
        ..Policy::default()
    });
    let bench = stock_bench(&ledger);
    ledger
        .produce_batch(NewBatchRequest::handload("one", 10).with_primer(bench.primer.id))
        .unwrap();

    let err = ledger
        .produce_batch(NewBatchRequest::handload("two", 10).with_primer(bench.primer.id))
        .unwrap_err();
    assert!(matches!(err, ReloadError::QuotaExceeded { .. }));
    assert_close(quantity(&ledger, &bench.primer.id), 490.0);
}

#[test]
fn test_shots_kept_in_order_with_pressure_signs() {
    let ledger = sqlite_ledger(Policy::default());
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let shots = vec![
        NewShot::new(2, Some(2801.0)),
        NewShot::new(1, Some(2795.0)).with_pressure(reload_core::storage::PressureSigns {
            flattened_primer: true,
            ..Default::default()
        }),
        NewShot::new(3, None),
    ];
    let record = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 3).with_shots(shots))
        .unwrap()
        .value;

    let stored = ledger.session_record(&record.session.id).unwrap();
    assert_eq!(stored.shots.len(), 2);
    assert_eq!(stored.shots[0].shot_number, 1);
    assert!(stored.shots[0].pressure.any());

    ledger.delete_session(&record.session.id, false).unwrap();
    assert!(ledger
        .store()
        .list_shots(OWNER, &record.session.id)
        .unwrap()
        .is_empty());
}
