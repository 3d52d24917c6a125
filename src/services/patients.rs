//! Patient record workflow
//!
//! Doctors create and update records that cross-reference three things: the
//! record itself (unique email and phone), the assigned nurse account and the
//! owning doctor account. Updating a record also carries its contact
//! details over to the account that shares the patient's old email; both
//! writes commit together or not at all.

use sqlx::SqliteConnection;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::{invalid_fields, normalize_email, present, LIST_LIMIT};
use crate::db::{accounts, patients, Database};
use crate::error::ApiError;
use crate::models::{now, Account, PatientPayload, PatientRecord, PatientStatus, Role};

const REQUIRED_FIELDS: &str =
    "Email, phone number, doctor, status, assigned nurse email, and username are required.";
const EMAIL_TAKEN: &str = "User with this email already exists.";
const PHONE_TAKEN: &str = "User with this phone number already exists.";
const NURSE_NOT_FOUND: &str = "Assigned nurse with this email does not exist.";
const DOCTOR_NOT_FOUND: &str = "Doctor with this ID does not exist or is not a doctor.";
const PATIENT_NOT_FOUND: &str = "Patient with this email does not exist.";
const DELETE_NOT_FOUND: &str = "Couldn't find patient data.";
const STATUS_RESET: &str = "Patient status cannot be reset to New.";

/// The fields every create and update must carry, normalized.
#[derive(Debug)]
struct ContactFields {
    email: String,
    phone_number: String,
    username: String,
    doctor_id: String,
    nurse_email: String,
    status: PatientStatus,
}

fn contact_fields(payload: &PatientPayload) -> Result<ContactFields, ApiError> {
    let (Some(email), Some(phone_number), Some(username), Some(doctor_id), Some(nurse_email), Some(status)) = (
        present(&payload.email),
        present(&payload.phone_number),
        present(&payload.username),
        present(&payload.doctor),
        present(&payload.assigned_nurse_email),
        present(&payload.status),
    ) else {
        return Err(ApiError::validation(REQUIRED_FIELDS));
    };

    let status = status
        .parse::<PatientStatus>()
        .map_err(|err| ApiError::validation(err.to_string()))?;

    Ok(ContactFields {
        email: normalize_email(email),
        phone_number: phone_number.trim().to_owned(),
        username: username.trim().to_owned(),
        doctor_id: doctor_id.trim().to_owned(),
        nurse_email: normalize_email(nurse_email),
        status,
    })
}

/// Nurse must exist with role nurse, doctor with role doctor.
async fn resolve_doctor(
    conn: &mut SqliteConnection,
    contact: &ContactFields,
) -> Result<Account, ApiError> {
    if accounts::find_by_email_and_role(&mut *conn, &contact.nurse_email, Role::Nurse)
        .await?
        .is_none()
    {
        warn!(nurse_email = %contact.nurse_email, "assigned nurse not found");
        return Err(ApiError::not_found(NURSE_NOT_FOUND));
    }

    match accounts::find_by_id(&mut *conn, &contact.doctor_id).await? {
        Some(doctor) if doctor.role == Role::Doctor => Ok(doctor),
        _ => {
            warn!(doctor_id = %contact.doctor_id, "referenced doctor not found");
            Err(ApiError::not_found(DOCTOR_NOT_FOUND))
        }
    }
}

fn note_foreign_owner(caller: &Account, doctor: &Account) {
    if caller.id != doctor.id {
        info!(caller = %caller.id, doctor = %doctor.id, "record assigned to another doctor");
    }
}

#[instrument(skip(db, caller, payload), fields(caller = %caller.id))]
pub async fn create_patient(
    db: &Database,
    caller: &Account,
    payload: PatientPayload,
) -> Result<PatientRecord, ApiError> {
    let contact = contact_fields(&payload)?;
    payload.validate().map_err(invalid_fields)?;

    let clinical = payload.clinical_inputs().map_err(|missing| {
        ApiError::validation(format!("Missing clinical fields: {}", missing.join(", ")))
    })?;
    let (Some(prediction), Some(probability)) = (payload.prediction, payload.probability) else {
        return Err(ApiError::validation("Prediction and probability are required."));
    };

    if let Some(existing) =
        patients::find_by_email_or_phone(db.pool(), &contact.email, &contact.phone_number).await?
    {
        let message = if existing.email == contact.email {
            EMAIL_TAKEN
        } else {
            PHONE_TAKEN
        };
        return Err(ApiError::conflict(message));
    }

    let doctor = {
        let mut conn = db.pool().acquire().await?;
        resolve_doctor(&mut conn, &contact).await?
    };
    note_foreign_owner(caller, &doctor);

    let created_at = now();
    let record = PatientRecord {
        id: Uuid::new_v4().to_string(),
        email: contact.email,
        phone_number: contact.phone_number,
        username: contact.username,
        doctor_id: doctor.id,
        doctor_name: doctor.username,
        doctor_email: doctor.email,
        assigned_nurse_email: contact.nurse_email,
        status: contact.status,
        clinical,
        prediction,
        probability,
        risk_level: payload.risk_level.unwrap_or_default(),
        recommendations: payload.recommendations(),
        created_at,
        updated_at: created_at,
    };

    patients::insert(db.pool(), &record).await?;

    info!(patient_id = %record.id, "patient created");
    Ok(record)
}

#[instrument(skip(db, caller, payload), fields(caller = %caller.id, old_email = ?payload.old_email))]
pub async fn update_patient(
    db: &Database,
    caller: &Account,
    payload: PatientPayload,
) -> Result<PatientRecord, ApiError> {
    let contact = contact_fields(&payload)?;
    let old_email = present(&payload.old_email)
        .map(normalize_email)
        .ok_or_else(|| ApiError::validation(REQUIRED_FIELDS))?;
    payload.validate().map_err(invalid_fields)?;

    // Lookup, update and account sync share one transaction; any early
    // return rolls all of it back.
    let mut tx = db.begin().await?;

    let existing = patients::find_by_email(&mut *tx, &old_email)
        .await?
        .ok_or_else(|| ApiError::not_found(PATIENT_NOT_FOUND))?;

    if existing.status != PatientStatus::New && contact.status == PatientStatus::New {
        return Err(ApiError::validation(STATUS_RESET));
    }

    let doctor = resolve_doctor(&mut tx, &contact).await?;
    if existing.doctor_id != caller.id {
        info!(owner = %existing.doctor_id, "updating a record owned by another doctor");
    }
    note_foreign_owner(caller, &doctor);

    let mut updated = existing;
    payload.merge_into(&mut updated);
    updated.email = contact.email;
    updated.phone_number = contact.phone_number;
    updated.username = contact.username;
    updated.assigned_nurse_email = contact.nurse_email;
    updated.status = contact.status;
    updated.doctor_id = doctor.id;
    updated.doctor_name = doctor.username;
    updated.doctor_email = doctor.email;
    updated.updated_at = now();

    let synced = store_update(&mut tx, &updated, &old_email).await?;
    tx.commit().await?;

    info!(patient_id = %updated.id, account_synced = synced, "patient updated");
    Ok(updated)
}

/// Write the record, then carry its contact details over to the account at
/// `old_email`. A record that vanished since it was read is a 404. Returns
/// whether an account was synced.
async fn store_update(
    conn: &mut SqliteConnection,
    updated: &PatientRecord,
    old_email: &str,
) -> Result<bool, ApiError> {
    if !patients::update(&mut *conn, updated).await? {
        warn!(patient_id = %updated.id, "record deleted before the update landed");
        return Err(ApiError::not_found(PATIENT_NOT_FOUND));
    }

    Ok(accounts::sync_contact(
        &mut *conn,
        old_email,
        &updated.email,
        &updated.username,
        &updated.phone_number,
    )
    .await?)
}

#[instrument(skip(db))]
pub async fn delete_patient(db: &Database, id: &str) -> Result<(), ApiError> {
    if !patients::delete(db.pool(), id).await? {
        return Err(ApiError::not_found(DELETE_NOT_FOUND));
    }
    info!("patient deleted");
    Ok(())
}

pub async fn list_for_doctor(db: &Database, doctor: &Account) -> Result<Vec<PatientRecord>, ApiError> {
    Ok(patients::list_for_doctor(db.pool(), &doctor.id, &doctor.email, LIST_LIMIT).await?)
}

pub async fn list_for_nurse(db: &Database, nurse: &Account) -> Result<Vec<PatientRecord>, ApiError> {
    Ok(patients::list_for_nurse(db.pool(), &nurse.email, LIST_LIMIT).await?)
}

/// The record that shares the account's email, shown under the account's
/// current username.
pub async fn own_record(db: &Database, account: &Account) -> Result<Option<PatientRecord>, ApiError> {
    let record = patients::find_by_email(db.pool(), &account.email).await?;
    Ok(record.map(|mut record| {
        record.username = account.username.clone();
        record
    }))
}
