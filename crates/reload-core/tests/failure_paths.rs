mod common;

use common::*;
use reload_core::storage::{BatchFilter, InventoryStore, NewFirearm, NewShot, SessionFilter};
use reload_core::{NewBatchRequest, NewSessionRequest, ReloadError, Step};

fn full_request(bench: &Bench, quantity: u32) -> NewBatchRequest {
    NewBatchRequest::handload("308-X", quantity)
        .with_primer(bench.primer.id)
        .with_powder(bench.powder.id, 42.5)
        .with_bullet(bench.bullet.id)
        .with_brass(bench.brass.id)
}

fn no_batches(ledger: &reload_core::Ledger<FaultyStore>) -> bool {
    ledger
        .store()
        .list_batches(OWNER, &BatchFilter::new())
        .unwrap()
        .is_empty()
}

#[test]
fn test_failed_batch_insert_returns_consumed_stock() {
    let ledger = faulty_ledger();
    let bench = stock_bench(&ledger);
    ledger.store().fail(Fault::InsertBatch);

    let err = ledger.produce_batch(full_request(&bench, 20)).unwrap_err();

    assert!(matches!(err, ReloadError::Storage(_)));
    assert!(no_batches(&ledger));
    assert_close(quantity(&ledger, &bench.primer.id), 500.0);
    assert_close(quantity(&ledger, &bench.powder.id), 1.0);
    assert_close(quantity(&ledger, &bench.bullet.id), 200.0);
    assert_close(quantity(&ledger, &bench.brass.id), 100.0);
}

#[test]
fn test_failed_compensation_reports_stranded_components() {
    let ledger = faulty_ledger();
    let bench = stock_bench(&ledger);
    ledger.store().fail(Fault::InsertBatch);
    ledger.store().fail(Fault::IncrementStock);

    let err = ledger.produce_batch(full_request(&bench, 20)).unwrap_err();

    match err {
        ReloadError::PartialFailure { stranded, .. } => {
            assert_eq!(stranded.len(), 4);
            assert!(stranded.contains(&bench.powder.id));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(no_batches(&ledger));
    assert_close(quantity(&ledger, &bench.primer.id), 480.0);
}

#[test]
fn test_failed_decrement_writes_nothing() {
    let ledger = faulty_ledger();
    let bench = stock_bench(&ledger);
    ledger.store().fail(Fault::DecrementStock);

    assert!(ledger.produce_batch(full_request(&bench, 20)).is_err());
    assert!(no_batches(&ledger));
    assert_close(quantity(&ledger, &bench.primer.id), 500.0);
}

#[test]
fn test_failed_session_insert_releases_reserved_rounds() {
    let ledger = faulty_ledger();
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("F", 20, None))
        .unwrap()
        .value;
    ledger.store().fail(Fault::InsertSession);

    let err = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 15).with_batch(batch.id))
        .unwrap_err();

    assert!(matches!(err, ReloadError::Storage(_)));
    assert_eq!(remaining(&ledger, &batch.id), 20);
    assert_eq!(round_count(&ledger, &firearm.id), 0);
}

#[test]
fn test_unreleased_rounds_reported_as_partial_failure() {
    let ledger = faulty_ledger();
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("F", 20, None))
        .unwrap()
        .value;
    ledger.store().fail(Fault::InsertSession);
    ledger.store().fail(Fault::IncrementCounter);

    let err = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 15).with_batch(batch.id))
        .unwrap_err();

    match err {
        ReloadError::PartialFailure { stranded, .. } => assert_eq!(stranded, vec![batch.id]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(remaining(&ledger, &batch.id), 5);
}

#[test]
fn test_shot_failures_are_warnings() {
    let ledger = faulty_ledger();
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    ledger.store().fail(Fault::InsertShot);

    let outcome = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 2).with_shots(vec![
            NewShot::new(1, Some(2790.0)),
            NewShot::new(2, Some(2802.0)),
        ]))
        .unwrap();

    assert_eq!(outcome.warnings.len(), 2);
    assert!(outcome.warnings.iter().all(|w| w.step == Step::RecordShot));
    assert!(outcome.value.shots.is_empty());
    assert_eq!(round_count(&ledger, &firearm.id), 2);
}

#[test]
fn test_round_count_failure_keeps_session() {
    let ledger = faulty_ledger();
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("F", 20, None))
        .unwrap()
        .value;
    ledger.store().fail(Fault::IncrementCounter);

    let outcome = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 8).with_batch(batch.id))
        .unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].step, Step::FirearmRoundCount);
    assert_eq!(remaining(&ledger, &batch.id), 12);
    assert_eq!(round_count(&ledger, &firearm.id), 0);
}

#[test]
fn test_session_delete_with_failed_returns_still_deletes() {
    let ledger = faulty_ledger();
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("F", 20, None))
        .unwrap()
        .value;
    let record = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 8).with_batch(batch.id))
        .unwrap()
        .value;
    ledger.store().fail(Fault::IncrementCounter);
    ledger.store().fail(Fault::DecrementCounter);

    let outcome = ledger.delete_session(&record.session.id, true).unwrap();

    let steps: Vec<Step> = outcome.warnings.iter().map(|w| w.step).collect();
    assert_eq!(steps, vec![Step::BatchRemaining, Step::FirearmRoundCount]);
    assert!(ledger
        .store()
        .list_sessions(OWNER, &SessionFilter::new())
        .unwrap()
        .is_empty());
    assert_eq!(remaining(&ledger, &batch.id), 12);
}

#[test]
fn test_session_delete_after_batch_deleted_warns() {
    let ledger = faulty_ledger();
    let firearm = ledger.add_firearm(NewFirearm::new(OWNER, "Tikka T3x")).unwrap();
    let batch = ledger
        .produce_batch(NewBatchRequest::factory("F", 20, None))
        .unwrap()
        .value;
    let record = ledger
        .fire_session(NewSessionRequest::new(firearm.id, 8).with_batch(batch.id))
        .unwrap()
        .value;
    ledger.delete_batch(&batch.id, false).unwrap();

    let outcome = ledger.delete_session(&record.session.id, true).unwrap();
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].step, Step::BatchRemaining);
    assert_eq!(round_count(&ledger, &firearm.id), 0);
}

#[test]
fn test_batch_delete_with_failed_returns_still_deletes() {
    let ledger = faulty_ledger();
    let bench = stock_bench(&ledger);
    let batch = ledger.produce_batch(full_request(&bench, 20)).unwrap().value;
    ledger.store().fail(Fault::IncrementStock);

    let outcome = ledger.delete_batch(&batch.id, true).unwrap();

    assert_eq!(outcome.warnings.len(), 4);
    assert!(outcome
        .warnings
        .iter()
        .all(|w| w.step == Step::ReturnComponent));
    assert!(no_batches(&ledger));
    assert_close(quantity(&ledger, &bench.primer.id), 480.0);
}

#[test]
fn test_failed_batch_delete_takes_back_returned_stock() {
    let ledger = faulty_ledger();
    let bench = stock_bench(&ledger);
    let batch = ledger.produce_batch(full_request(&bench, 20)).unwrap().value;
    ledger.store().fail(Fault::DeleteBatch);

    let err = ledger.delete_batch(&batch.id, true).unwrap_err();

    assert!(matches!(err, ReloadError::Storage(_)));
    assert!(ledger.store().get_batch(OWNER, &batch.id).unwrap().is_some());
    assert_close(quantity(&ledger, &bench.primer.id), 480.0);
    assert_close(quantity(&ledger, &bench.brass.id), 80.0);

    ledger.store().heal();
    ledger.delete_batch(&batch.id, true).unwrap();
    assert_close(quantity(&ledger, &bench.primer.id), 500.0);
}
