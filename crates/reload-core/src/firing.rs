//! Shooting sessions: logging and reversal.
//!
//! Rounds are reserved from the batch with a conditional decrement before
//! the session row is written, so two sessions racing on the same batch
//! cannot overdraw it. Everything after the session insert is best effort
//! and reported as warnings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ReloadError, Result};
use crate::ledger::Ledger;
use crate::outcome::{ActionOutcome, Step, WarningLog};
use crate::quota::LimitKind;
use crate::storage::{
    Conditions, Counter, InventoryStore, NewSession, NewShot, ShootingSession, ShotRecord,
};

/// A session as logged at the range.
#[derive(Debug, Clone)]
pub struct NewSessionRequest {
    pub firearm_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub rounds_fired: u32,
    pub date: Option<DateTime<Utc>>,
    pub conditions: Conditions,

    /// Shot telemetry; shots without a velocity are not stored
    pub shots: Vec<NewShot>,
}

impl NewSessionRequest {
    pub fn new(firearm_id: Uuid, rounds_fired: u32) -> Self {
        Self {
            firearm_id,
            batch_id: None,
            rounds_fired,
            date: None,
            conditions: Conditions::default(),
            shots: Vec::new(),
        }
    }

    pub fn with_batch(mut self, batch_id: Uuid) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_shots(mut self, shots: Vec<NewShot>) -> Self {
        self.shots = shots;
        self
    }
}

/// A stored session with the shots that were recorded for it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub session: ShootingSession,
    pub shots: Vec<ShotRecord>,
}

impl<S: InventoryStore> Ledger<S> {
    /// Log a shooting session.
    ///
    /// # Errors
    ///
    /// - `ReloadError::Validation` / `NotFound` for a bad request
    /// - `ReloadError::InsufficientRounds` if the batch cannot cover
    ///   `rounds_fired`, either on the first read or at reservation time
    /// - `ReloadError::QuotaExceeded` when the session ceiling is reached
    /// - the insert error, after the reserved rounds are put back
    pub fn fire_session(&self, request: NewSessionRequest) -> Result<ActionOutcome<SessionRecord>> {
        if request.rounds_fired == 0 {
            return Err(ReloadError::Validation(
                "Rounds fired must be at least 1".to_string(),
            ));
        }
        if request.shots.iter().any(|shot| shot.shot_number == 0) {
            return Err(ReloadError::Validation(
                "Shot numbers start at 1".to_string(),
            ));
        }

        self.require_firearm(&request.firearm_id)?;
        if let Some(batch_id) = request.batch_id {
            let batch = self
                .store
                .get_batch(&self.owner, &batch_id)?
                .ok_or_else(|| ReloadError::NotFound(format!("batch {}", batch_id)))?;
            if request.rounds_fired > batch.quantity_remaining {
                return Err(ReloadError::InsufficientRounds {
                    requested: request.rounds_fired,
                    available: batch.quantity_remaining,
                });
            }
        }
        self.ensure_capacity(LimitKind::Sessions)?;

        let rounds = u64::from(request.rounds_fired);
        if let Some(batch_id) = request.batch_id {
            self.reserve_rounds(batch_id, request.rounds_fired)?;
        }

        let new_session = NewSession {
            owner: self.owner.clone(),
            firearm_id: request.firearm_id,
            ammunition_batch_id: request.batch_id,
            rounds_fired: request.rounds_fired,
            date: request.date.unwrap_or_else(Utc::now),
            conditions: request.conditions,
        };
        let session = match self
            .store
            .insert_session(&new_session, self.policy.ceiling(LimitKind::Sessions))
        {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(error = %err, "session insert failed, releasing reserved rounds");
                return Err(self.release_rounds(request.batch_id, rounds, err));
            }
        };

        let mut warnings = WarningLog::default();
        let mut shots = Vec::new();
        for shot in request.shots.iter().filter(|shot| shot.velocity_fps.is_some()) {
            match self.store.insert_shot(&self.owner, &session.id, shot) {
                Ok(record) => shots.push(record),
                Err(err) => warnings.push(
                    Step::RecordShot,
                    format!("shot {}: {}", shot.shot_number, err),
                ),
            }
        }

        if let Err(err) = self.store.increment_counter(
            &self.owner,
            Counter::FirearmRoundCount(request.firearm_id),
            rounds,
        ) {
            warnings.push(Step::FirearmRoundCount, err.to_string());
        }

        tracing::info!(
            id = %session.id,
            firearm = %session.firearm_id,
            rounds = session.rounds_fired,
            shots = shots.len(),
            "session logged"
        );
        Ok(warnings.finish(SessionRecord { session, shots }))
    }

    /// Take rounds from a batch only if they are all there.
    fn reserve_rounds(&self, batch_id: Uuid, rounds_fired: u32) -> Result<()> {
        let reserved = self.store.decrement_counter_if_available(
            &self.owner,
            Counter::BatchRemaining(batch_id),
            u64::from(rounds_fired),
        )?;
        if reserved.is_some() {
            return Ok(());
        }

        let available = self
            .store
            .get_batch(&self.owner, &batch_id)
            .ok()
            .flatten()
            .map(|batch| batch.quantity_remaining)
            .unwrap_or(0);
        tracing::warn!(
            batch = %batch_id,
            requested = rounds_fired,
            available,
            "batch drawn down concurrently, session refused"
        );
        Err(ReloadError::InsufficientRounds {
            requested: rounds_fired,
            available,
        })
    }

    fn release_rounds(&self, batch_id: Option<Uuid>, rounds: u64, cause: ReloadError) -> ReloadError {
        let Some(batch_id) = batch_id else {
            return cause;
        };
        match self
            .store
            .increment_counter(&self.owner, Counter::BatchRemaining(batch_id), rounds)
        {
            Ok(_) => cause,
            Err(err) => {
                tracing::error!(batch = %batch_id, error = %err, "could not release reserved rounds");
                ReloadError::PartialFailure {
                    message: cause.to_string(),
                    stranded: vec![batch_id],
                }
            }
        }
    }

    /// Delete a session and its shots, optionally putting its rounds back.
    ///
    /// The session row is deleted first. With `return_rounds`, the batch
    /// gets its rounds back (never above its production quantity) and the
    /// firearm's round count drops (never below zero); either failing is a
    /// warning.
    pub fn delete_session(
        &self,
        id: &Uuid,
        return_rounds: bool,
    ) -> Result<ActionOutcome<ShootingSession>> {
        let session = self
            .store
            .get_session(&self.owner, id)?
            .ok_or_else(|| ReloadError::NotFound(format!("session {}", id)))?;

        if !self.store.delete_session(&self.owner, id)? {
            return Err(ReloadError::NotFound(format!("session {}", id)));
        }

        let mut warnings = WarningLog::default();
        if return_rounds {
            let rounds = u64::from(session.rounds_fired);
            if let Some(batch_id) = session.ammunition_batch_id {
                match self.store.increment_counter(
                    &self.owner,
                    Counter::BatchRemaining(batch_id),
                    rounds,
                ) {
                    Ok(adjustment) if adjustment.applied() < rounds => {
                        tracing::debug!(
                            batch = %batch_id,
                            returned = adjustment.applied(),
                            requested = rounds,
                            "batch return capped at production quantity"
                        );
                    }
                    Ok(_) => {}
                    Err(ReloadError::NotFound(_)) => warnings.push(
                        Step::BatchRemaining,
                        format!("batch {} no longer exists", batch_id),
                    ),
                    Err(err) => warnings.push(Step::BatchRemaining, err.to_string()),
                }
            }

            match self.store.decrement_counter_with_floor(
                &self.owner,
                Counter::FirearmRoundCount(session.firearm_id),
                rounds,
            ) {
                Ok(_) => {}
                Err(ReloadError::NotFound(_)) => warnings.push(
                    Step::FirearmRoundCount,
                    format!("firearm {} no longer exists", session.firearm_id),
                ),
                Err(err) => warnings.push(Step::FirearmRoundCount, err.to_string()),
            }
        }

        tracing::info!(%id, return_rounds, "session deleted");
        Ok(warnings.finish(session))
    }

    /// A session with its recorded shots.
    pub fn session_record(&self, id: &Uuid) -> Result<SessionRecord> {
        let session = self
            .store
            .get_session(&self.owner, id)?
            .ok_or_else(|| ReloadError::NotFound(format!("session {}", id)))?;
        let shots = self.store.list_shots(&self.owner, id)?;
        Ok(SessionRecord { session, shots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Policy;
    use crate::storage::{NewFirearm, SqliteStore};

    fn ledger() -> Ledger<SqliteStore> {
        Ledger::new(SqliteStore::open_in_memory().unwrap(), "u", Policy::default())
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let ledger = ledger();
        let firearm = ledger.add_firearm(NewFirearm::new("u", "Rifle")).unwrap();
        assert!(matches!(
            ledger.fire_session(NewSessionRequest::new(firearm.id, 0)),
            Err(ReloadError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_firearm_rejected() {
        assert!(matches!(
            ledger().fire_session(NewSessionRequest::new(Uuid::new_v4(), 5)),
            Err(ReloadError::NotFound(_))
        ));
    }

    #[test]
    fn test_session_without_batch_counts_rounds_and_keeps_only_clocked_shots() {
        let ledger = ledger();
        let firearm = ledger.add_firearm(NewFirearm::new("u", "Rifle")).unwrap();
        let shots = vec![
            NewShot::new(1, Some(2790.0)),
            NewShot::new(2, None),
            NewShot::new(3, Some(2805.0)),
        ];
        let outcome = ledger
            .fire_session(NewSessionRequest::new(firearm.id, 5).with_shots(shots))
            .unwrap();
        assert!(outcome.is_clean());
        assert_eq!(outcome.value.shots.len(), 2);

        let firearm = ledger.store().get_firearm("u", &firearm.id).unwrap().unwrap();
        assert_eq!(firearm.round_count, 5);

        let record = ledger.session_record(&outcome.value.session.id).unwrap();
        let numbers: Vec<u32> = record.shots.iter().map(|s| s.shot_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn test_delete_session_without_return_leaves_counts() {
        let ledger = ledger();
        let firearm = ledger.add_firearm(NewFirearm::new("u", "Rifle")).unwrap();
        let outcome = ledger
            .fire_session(NewSessionRequest::new(firearm.id, 12))
            .unwrap();
        ledger
            .delete_session(&outcome.value.session.id, false)
            .unwrap();
        let firearm = ledger.store().get_firearm("u", &firearm.id).unwrap().unwrap();
        assert_eq!(firearm.round_count, 12);
    }
}
