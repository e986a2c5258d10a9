//! Maintenance due status, derived from firearm round counts and dates.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ReloadError, Result};
use crate::ledger::Ledger;
use crate::storage::{Firearm, InventoryStore, MaintenanceTask, NewMaintenanceTask};

/// Fraction of an interval after which a task is reported as due soon.
pub const DUE_SOON_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Ok,
    DueSoon,
    Overdue,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Ok => "ok",
            MaintenanceStatus::DueSoon => "due soon",
            MaintenanceStatus::Overdue => "overdue",
        }
    }
}

fn status_for(used: f64, interval: f64) -> MaintenanceStatus {
    if interval <= 0.0 || used >= interval {
        MaintenanceStatus::Overdue
    } else if used >= interval * DUE_SOON_RATIO {
        MaintenanceStatus::DueSoon
    } else {
        MaintenanceStatus::Ok
    }
}

/// Worst of the round-based and day-based status for a task.
///
/// A round count that went down since the task was done (session
/// reversals) counts as zero rounds used.
pub fn maintenance_status(
    task: &MaintenanceTask,
    round_count: u64,
    now: DateTime<Utc>,
) -> MaintenanceStatus {
    let by_rounds = task.interval_rounds.map(|interval| {
        let used = round_count.saturating_sub(task.last_round_count);
        status_for(used as f64, interval as f64)
    });
    let by_days = task.interval_days.map(|interval| {
        let days = (now - task.last_performed).num_days().max(0);
        status_for(days as f64, f64::from(interval))
    });

    [by_rounds, by_days]
        .into_iter()
        .flatten()
        .max_by_key(|status| match status {
            MaintenanceStatus::Ok => 0,
            MaintenanceStatus::DueSoon => 1,
            MaintenanceStatus::Overdue => 2,
        })
        .unwrap_or(MaintenanceStatus::Ok)
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceItem {
    pub task: MaintenanceTask,
    pub status: MaintenanceStatus,
    pub rounds_since: u64,
}

impl<S: InventoryStore> Ledger<S> {
    pub fn add_maintenance_task(&self, task: NewMaintenanceTask) -> Result<MaintenanceTask> {
        let created = self.store.insert_maintenance_task(&self.owner, &task)?;
        tracing::info!(id = %created.id, firearm = %created.firearm_id, "maintenance task added");
        Ok(created)
    }

    pub fn complete_maintenance(&self, task_id: &Uuid) -> Result<MaintenanceTask> {
        self.store.mark_maintenance_performed(&self.owner, task_id)
    }

    /// Current status of every task on a firearm.
    pub fn maintenance_report(
        &self,
        firearm_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Firearm, Vec<MaintenanceItem>)> {
        let firearm = self
            .store
            .get_firearm(&self.owner, firearm_id)?
            .ok_or_else(|| ReloadError::NotFound(format!("firearm {}", firearm_id)))?;
        let items = self
            .store
            .list_maintenance_tasks(&self.owner, firearm_id)?
            .into_iter()
            .map(|task| MaintenanceItem {
                status: maintenance_status(&task, firearm.round_count, now),
                rounds_since: firearm.round_count.saturating_sub(task.last_round_count),
                task,
            })
            .collect();
        Ok((firearm, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(interval_rounds: Option<u64>, interval_days: Option<u32>) -> MaintenanceTask {
        MaintenanceTask {
            id: Uuid::new_v4(),
            firearm_id: Uuid::new_v4(),
            name: "clean bore".to_string(),
            interval_rounds,
            interval_days,
            last_round_count: 100,
            last_performed: Utc::now(),
        }
    }

    #[test]
    fn test_round_interval_thresholds() {
        let task = task(Some(500), None);
        let now = Utc::now();
        assert_eq!(maintenance_status(&task, 100, now), MaintenanceStatus::Ok);
        assert_eq!(maintenance_status(&task, 560, now), MaintenanceStatus::DueSoon);
        assert_eq!(maintenance_status(&task, 600, now), MaintenanceStatus::Overdue);
    }

    #[test]
    fn test_round_count_below_last_service_is_ok() {
        let task = task(Some(500), None);
        assert_eq!(maintenance_status(&task, 40, Utc::now()), MaintenanceStatus::Ok);
    }

    #[test]
    fn test_worst_of_rounds_and_days() {
        let task = task(Some(500), Some(30));
        let later = task.last_performed + Duration::days(31);
        assert_eq!(maintenance_status(&task, 110, later), MaintenanceStatus::Overdue);
    }
}
