use chrono::NaiveDate;
use tracing::info;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError, check_len};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub id: Ulid,
    pub room_id: Ulid,
    pub staff_id: Option<Ulid>,
    pub task_type: TaskType,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub scheduled_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub staff_id: Option<Option<Ulid>>,
    pub task_type: Option<TaskType>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}

/// Stamp completion on entry to Completed, clear it on reopen.
fn stamp_completion(task: &mut HousekeepingTask, previous: Option<TaskStatus>) {
    match (previous, task.status) {
        (Some(TaskStatus::Completed), TaskStatus::Completed) => {}
        (_, TaskStatus::Completed) => task.completed_at = Some(now_ms()),
        _ => task.completed_at = None,
    }
}

impl Engine {
    /// Schedule a task. An open maintenance task puts the room under
    /// maintenance in the same commit.
    pub async fn create_task(&self, new: NewTask) -> Result<HousekeepingTask, EngineError> {
        check_len(new.notes.as_deref(), MAX_TEXT_LEN, "notes too long")?;
        let mut txn = self.lock_room(new.room_id).await?;
        if self.entity_to_room.contains_key(&new.id) {
            return Err(EngineError::AlreadyExists(new.id.to_string()));
        }
        if txn.state.tasks.len() >= MAX_TASKS_PER_ROOM {
            return Err(EngineError::LimitExceeded("too many tasks on room"));
        }
        if let Some(sid) = new.staff_id {
            self.pin_staff(sid)?;
        }

        let mut task = HousekeepingTask {
            id: new.id,
            room_id: new.room_id,
            staff_id: new.staff_id,
            task_type: new.task_type,
            priority: new.priority,
            status: new.status,
            scheduled_date: new.scheduled_date,
            completed_at: None,
            notes: new.notes,
            created_at: now_ms(),
        };
        stamp_completion(&mut task, None);

        let result = self
            .commit(&mut txn, vec![Event::TaskCreated { task: task.clone() }])
            .await;
        if let Err(e) = result {
            if let Some(sid) = new.staff_id {
                self.unpin_staff(sid);
            }
            return Err(e);
        }
        info!(
            "{} task {} scheduled for room {} on {}",
            task.task_type.as_str(),
            task.id,
            txn.state.room.number,
            task.scheduled_date
        );
        Ok(task)
    }

    pub async fn update_task(&self, id: Ulid, patch: TaskPatch) -> Result<HousekeepingTask, EngineError> {
        if let Some(Some(notes)) = &patch.notes {
            check_len(Some(notes), MAX_TEXT_LEN, "notes too long")?;
        }
        let mut txn = self.resolve_entity(id).await?;
        let current = txn.state.task(id).cloned().ok_or(EngineError::NotFound(id))?;

        let mut next = current.clone();
        if let Some(staff_id) = patch.staff_id {
            next.staff_id = staff_id;
        }
        if let Some(task_type) = patch.task_type {
            next.task_type = task_type;
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(date) = patch.scheduled_date {
            next.scheduled_date = date;
        }
        if let Some(notes) = patch.notes {
            next.notes = notes;
        }
        stamp_completion(&mut next, Some(current.status));
        if next == current {
            return Ok(current);
        }

        let reassigned = next.staff_id != current.staff_id;
        if reassigned && let Some(sid) = next.staff_id {
            self.pin_staff(sid)?;
        }
        let result = self
            .commit(&mut txn, vec![Event::TaskUpdated { task: next.clone() }])
            .await;
        if reassigned {
            // Release whichever assignment did not survive.
            let released = if result.is_ok() { current.staff_id } else { next.staff_id };
            if let Some(sid) = released {
                self.unpin_staff(sid);
            }
        }
        result?;
        Ok(next)
    }

    /// Mark a task done. Completing the last open maintenance task hands the
    /// room back to its bookings. Returns the room as it stands afterwards.
    pub async fn complete_task(&self, id: Ulid) -> Result<(Room, HousekeepingTask), EngineError> {
        let mut txn = self.resolve_entity(id).await?;
        let current = txn.state.task(id).cloned().ok_or(EngineError::NotFound(id))?;
        if current.status == TaskStatus::Completed {
            return Ok((txn.state.room.clone(), current));
        }

        let mut next = current;
        next.status = TaskStatus::Completed;
        next.completed_at = Some(now_ms());
        self.commit(&mut txn, vec![Event::TaskUpdated { task: next.clone() }])
            .await?;
        info!(
            "{} task {id} completed, room {} is {}",
            next.task_type.as_str(),
            txn.state.room.number,
            txn.state.room.status
        );
        Ok((txn.state.room.clone(), next))
    }

    pub async fn delete_task(&self, id: Ulid) -> Result<(), EngineError> {
        let mut txn = self.resolve_entity(id).await?;
        let current = txn.state.task(id).cloned().ok_or(EngineError::NotFound(id))?;
        self.commit(&mut txn, vec![Event::TaskDeleted {
            id,
            room_id: current.room_id,
        }])
        .await?;
        if let Some(sid) = current.staff_id {
            self.unpin_staff(sid);
        }
        Ok(())
    }
}
