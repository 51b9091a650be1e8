//! Guests and staff. Neither belongs to a room, so their writes are
//! serialized by the directory mutex instead of a room lock. Bookings pin
//! their guest and tasks pin their assigned staff member; a pinned record
//! cannot be deleted.

use dashmap::DashMap;
use tracing::info;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError, Entry, check_len, check_required};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuest {
    pub id: Ulid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub id_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Option<String>>,
    pub id_number: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStaff {
    pub id: Ulid,
    pub username: String,
    /// Stored as given; never interpreted.
    pub credential_hash: String,
    pub full_name: String,
    pub role: StaffRole,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffPatch {
    pub username: Option<String>,
    pub credential_hash: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<StaffRole>,
    pub email: Option<String>,
}

fn key(s: &str) -> String {
    s.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), EngineError> {
    check_required(email, MAX_NAME_LEN, "email is empty", "email too long")?;
    if !email.contains('@') {
        return Err(EngineError::Invalid("email must contain '@'"));
    }
    Ok(())
}

fn validate_guest(g: &Guest) -> Result<(), EngineError> {
    check_required(&g.first_name, MAX_NAME_LEN, "first name is empty", "first name too long")?;
    check_required(&g.last_name, MAX_NAME_LEN, "last name is empty", "last name too long")?;
    validate_email(&g.email)?;
    check_len(Some(&g.phone), MAX_NAME_LEN, "phone too long")?;
    check_len(g.address.as_deref(), MAX_TEXT_LEN, "address too long")?;
    check_len(g.id_number.as_deref(), MAX_NAME_LEN, "id number too long")
}

fn validate_staff(s: &Staff) -> Result<(), EngineError> {
    check_required(&s.username, MAX_NAME_LEN, "username is empty", "username too long")?;
    check_len(Some(&s.credential_hash), MAX_TEXT_LEN, "credential hash too long")?;
    check_required(&s.full_name, MAX_NAME_LEN, "full name is empty", "full name too long")?;
    validate_email(&s.email)
}

/// `Err` if `value` is already indexed to a record other than `owner`.
fn ensure_unique(
    index: &DashMap<String, Ulid>,
    value: &str,
    owner: Ulid,
    what: &str,
) -> Result<(), EngineError> {
    match index.get(&key(value)) {
        Some(holder) if *holder != owner => {
            Err(EngineError::AlreadyExists(format!("{what} {value}")))
        }
        _ => Ok(()),
    }
}

fn pin<T>(map: &DashMap<Ulid, Entry<T>>, id: Ulid) -> Result<(), EngineError> {
    match map.get_mut(&id) {
        Some(mut e) if !e.retired => {
            e.refs += 1;
            Ok(())
        }
        _ => Err(EngineError::NotFound(id)),
    }
}

fn unpin<T>(map: &DashMap<Ulid, Entry<T>>, id: Ulid) {
    if let Some(mut e) = map.get_mut(&id) {
        e.refs = e.refs.saturating_sub(1);
    }
}

/// Mark an unreferenced record as being deleted.
fn retire<T>(map: &DashMap<Ulid, Entry<T>>, id: Ulid, entity: &'static str) -> Result<(), EngineError> {
    let mut e = map.get_mut(&id).ok_or(EngineError::NotFound(id))?;
    if e.retired {
        return Err(EngineError::NotFound(id));
    }
    if e.refs > 0 {
        return Err(EngineError::InUse { entity, id });
    }
    e.retired = true;
    Ok(())
}

fn unretire<T>(map: &DashMap<Ulid, Entry<T>>, id: Ulid) {
    if let Some(mut e) = map.get_mut(&id) {
        e.retired = false;
    }
}

impl Engine {
    pub(super) fn pin_guest(&self, id: Ulid) -> Result<(), EngineError> {
        pin(&self.guests, id)
    }

    pub(super) fn unpin_guest(&self, id: Ulid) {
        unpin(&self.guests, id)
    }

    pub(super) fn pin_staff(&self, id: Ulid) -> Result<(), EngineError> {
        pin(&self.staff, id)
    }

    pub(super) fn unpin_staff(&self, id: Ulid) {
        unpin(&self.staff, id)
    }

    /// Insert or replace a guest, keeping its pin count and email index.
    pub(super) fn put_guest(&self, guest: Guest) {
        let email = key(&guest.email);
        let previous = self.guests.get(&guest.id).map(|e| key(&e.record.email));
        if let Some(old) = previous
            && old != email
        {
            self.guest_emails.remove(&old);
        }
        self.guest_emails.insert(email, guest.id);
        match self.guests.get_mut(&guest.id) {
            Some(mut e) => e.record = guest,
            None => {
                self.guests.insert(guest.id, Entry::new(guest));
            }
        }
    }

    pub(super) fn drop_guest(&self, id: &Ulid) {
        if let Some((_, e)) = self.guests.remove(id) {
            self.guest_emails.remove(&key(&e.record.email));
        }
    }

    pub(super) fn put_staff(&self, staff: Staff) {
        let username = key(&staff.username);
        let email = key(&staff.email);
        let previous = self
            .staff
            .get(&staff.id)
            .map(|e| (key(&e.record.username), key(&e.record.email)));
        if let Some((old_username, old_email)) = previous {
            if old_username != username {
                self.staff_usernames.remove(&old_username);
            }
            if old_email != email {
                self.staff_emails.remove(&old_email);
            }
        }
        self.staff_usernames.insert(username, staff.id);
        self.staff_emails.insert(email, staff.id);
        match self.staff.get_mut(&staff.id) {
            Some(mut e) => e.record = staff,
            None => {
                self.staff.insert(staff.id, Entry::new(staff));
            }
        }
    }

    pub(super) fn drop_staff(&self, id: &Ulid) {
        if let Some((_, e)) = self.staff.remove(id) {
            self.staff_usernames.remove(&key(&e.record.username));
            self.staff_emails.remove(&key(&e.record.email));
        }
    }

    // ── Guests ──────────────────────────────────────────────

    pub async fn create_guest(&self, new: NewGuest) -> Result<Guest, EngineError> {
        let guest = Guest {
            id: new.id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email.trim().to_string(),
            phone: new.phone,
            address: new.address,
            id_number: new.id_number,
            created_at: now_ms(),
        };
        validate_guest(&guest)?;

        let _dir = self.directory.lock().await;
        let _gate = self.gate.read().await;
        if self.guests.len() >= MAX_GUESTS {
            return Err(EngineError::LimitExceeded("too many guests"));
        }
        if self.guests.contains_key(&guest.id) {
            return Err(EngineError::AlreadyExists(guest.id.to_string()));
        }
        ensure_unique(&self.guest_emails, &guest.email, guest.id, "guest email")?;

        let event = Event::GuestCreated {
            guest: guest.clone(),
        };
        self.wal_append(std::slice::from_ref(&event)).await?;
        self.put_guest(guest.clone());
        info!("guest {} registered", guest.id);
        Ok(guest)
    }

    pub async fn update_guest(&self, id: Ulid, patch: GuestPatch) -> Result<Guest, EngineError> {
        let _dir = self.directory.lock().await;
        let _gate = self.gate.read().await;
        let current = self
            .guests
            .get(&id)
            .filter(|e| !e.retired)
            .map(|e| e.record.clone())
            .ok_or(EngineError::NotFound(id))?;

        let next = Guest {
            first_name: patch.first_name.unwrap_or(current.first_name.clone()),
            last_name: patch.last_name.unwrap_or(current.last_name.clone()),
            email: patch
                .email
                .map(|e| e.trim().to_string())
                .unwrap_or(current.email.clone()),
            phone: patch.phone.unwrap_or(current.phone.clone()),
            address: patch.address.unwrap_or(current.address.clone()),
            id_number: patch.id_number.unwrap_or(current.id_number.clone()),
            ..current.clone()
        };
        validate_guest(&next)?;
        if next == current {
            return Ok(current);
        }
        ensure_unique(&self.guest_emails, &next.email, id, "guest email")?;

        let event = Event::GuestUpdated {
            guest: next.clone(),
        };
        self.wal_append(std::slice::from_ref(&event)).await?;
        self.put_guest(next.clone());
        Ok(next)
    }

    /// Delete a guest no booking refers to.
    pub async fn delete_guest(&self, id: Ulid) -> Result<(), EngineError> {
        let _dir = self.directory.lock().await;
        let _gate = self.gate.read().await;
        retire(&self.guests, id, "guest")?;
        if let Err(e) = self.wal_append(&[Event::GuestDeleted { id }]).await {
            unretire(&self.guests, id);
            return Err(e);
        }
        self.drop_guest(&id);
        info!("guest {id} deleted");
        Ok(())
    }

    // ── Staff ───────────────────────────────────────────────

    pub async fn create_staff(&self, new: NewStaff) -> Result<Staff, EngineError> {
        let staff = Staff {
            id: new.id,
            username: new.username.trim().to_string(),
            credential_hash: new.credential_hash,
            full_name: new.full_name,
            role: new.role,
            email: new.email.trim().to_string(),
            created_at: now_ms(),
        };
        validate_staff(&staff)?;

        let _dir = self.directory.lock().await;
        let _gate = self.gate.read().await;
        if self.staff.len() >= MAX_STAFF {
            return Err(EngineError::LimitExceeded("too many staff"));
        }
        if self.staff.contains_key(&staff.id) {
            return Err(EngineError::AlreadyExists(staff.id.to_string()));
        }
        ensure_unique(&self.staff_usernames, &staff.username, staff.id, "username")?;
        ensure_unique(&self.staff_emails, &staff.email, staff.id, "staff email")?;

        let event = Event::StaffCreated {
            staff: staff.clone(),
        };
        self.wal_append(std::slice::from_ref(&event)).await?;
        self.put_staff(staff.clone());
        info!("staff {} ({}) added", staff.username, staff.role.as_str());
        Ok(staff)
    }

    pub async fn update_staff(&self, id: Ulid, patch: StaffPatch) -> Result<Staff, EngineError> {
        let _dir = self.directory.lock().await;
        let _gate = self.gate.read().await;
        let current = self
            .staff
            .get(&id)
            .filter(|e| !e.retired)
            .map(|e| e.record.clone())
            .ok_or(EngineError::NotFound(id))?;

        let next = Staff {
            username: patch
                .username
                .map(|u| u.trim().to_string())
                .unwrap_or(current.username.clone()),
            credential_hash: patch.credential_hash.unwrap_or(current.credential_hash.clone()),
            full_name: patch.full_name.unwrap_or(current.full_name.clone()),
            role: patch.role.unwrap_or(current.role),
            email: patch
                .email
                .map(|e| e.trim().to_string())
                .unwrap_or(current.email.clone()),
            ..current.clone()
        };
        validate_staff(&next)?;
        if next == current {
            return Ok(current);
        }
        ensure_unique(&self.staff_usernames, &next.username, id, "username")?;
        ensure_unique(&self.staff_emails, &next.email, id, "staff email")?;

        let event = Event::StaffUpdated {
            staff: next.clone(),
        };
        self.wal_append(std::slice::from_ref(&event)).await?;
        self.put_staff(next.clone());
        Ok(next)
    }

    /// Delete a staff member no task is assigned to.
    pub async fn delete_staff(&self, id: Ulid) -> Result<(), EngineError> {
        let _dir = self.directory.lock().await;
        let _gate = self.gate.read().await;
        retire(&self.staff, id, "staff")?;
        if let Err(e) = self.wal_append(&[Event::StaffDeleted { id }]).await {
            unretire(&self.staff, id);
            return Err(e);
        }
        self.drop_staff(&id);
        info!("staff {id} deleted");
        Ok(())
    }
}
