//! Patient record queries

use sqlx::types::Json;
use sqlx::SqliteExecutor;

use crate::models::PatientRecord;

const COLUMNS: &str = "id, email, phone_number, username, doctor_id, doctor_name, doctor_email,
    assigned_nurse_email, status, age, sex, chest_pain, resting_bp, cholesterol, fasting_bs,
    resting_ecg, max_hr, exercise_angina, oldpeak, st_slope, prediction, probability,
    risk_level, lifestyle, medications, monitoring, referrals, urgent_actions,
    created_at, updated_at";

pub async fn insert<'e, E>(executor: E, record: &PatientRecord) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let clinical = &record.clinical;
    let recommendations = &record.recommendations;

    sqlx::query(&format!(
        "INSERT INTO patients ({}) VALUES (
            ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
        )",
        COLUMNS
    ))
    .bind(&record.id)
    .bind(&record.email)
    .bind(&record.phone_number)
    .bind(&record.username)
    .bind(&record.doctor_id)
    .bind(&record.doctor_name)
    .bind(&record.doctor_email)
    .bind(&record.assigned_nurse_email)
    .bind(record.status)
    .bind(clinical.age)
    .bind(clinical.sex)
    .bind(clinical.chest_pain)
    .bind(clinical.resting_bp)
    .bind(clinical.cholesterol)
    .bind(clinical.fasting_bs)
    .bind(clinical.resting_ecg)
    .bind(clinical.max_hr)
    .bind(clinical.exercise_angina)
    .bind(clinical.oldpeak)
    .bind(clinical.st_slope)
    .bind(record.prediction)
    .bind(record.probability)
    .bind(record.risk_level)
    .bind(Json(&recommendations.lifestyle))
    .bind(Json(&recommendations.medications))
    .bind(Json(&recommendations.monitoring))
    .bind(Json(&recommendations.referrals))
    .bind(Json(&recommendations.urgent_actions))
    .bind(record.created_at.timestamp_millis())
    .bind(record.updated_at.timestamp_millis())
    .execute(executor)
    .await?;

    Ok(())
}

/// Write every mutable column of `record` over the row with the same id.
pub async fn update<'e, E>(executor: E, record: &PatientRecord) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let clinical = &record.clinical;
    let recommendations = &record.recommendations;

    let result = sqlx::query(
        "UPDATE patients SET
            email = ?, phone_number = ?, username = ?,
            doctor_id = ?, doctor_name = ?, doctor_email = ?,
            assigned_nurse_email = ?, status = ?,
            age = ?, sex = ?, chest_pain = ?, resting_bp = ?, cholesterol = ?,
            fasting_bs = ?, resting_ecg = ?, max_hr = ?, exercise_angina = ?,
            oldpeak = ?, st_slope = ?,
            prediction = ?, probability = ?, risk_level = ?,
            lifestyle = ?, medications = ?, monitoring = ?, referrals = ?, urgent_actions = ?,
            updated_at = ?
         WHERE id = ?",
    )
    .bind(&record.email)
    .bind(&record.phone_number)
    .bind(&record.username)
    .bind(&record.doctor_id)
    .bind(&record.doctor_name)
    .bind(&record.doctor_email)
    .bind(&record.assigned_nurse_email)
    .bind(record.status)
    .bind(clinical.age)
    .bind(clinical.sex)
    .bind(clinical.chest_pain)
    .bind(clinical.resting_bp)
    .bind(clinical.cholesterol)
    .bind(clinical.fasting_bs)
    .bind(clinical.resting_ecg)
    .bind(clinical.max_hr)
    .bind(clinical.exercise_angina)
    .bind(clinical.oldpeak)
    .bind(clinical.st_slope)
    .bind(record.prediction)
    .bind(record.probability)
    .bind(record.risk_level)
    .bind(Json(&recommendations.lifestyle))
    .bind(Json(&recommendations.medications))
    .bind(Json(&recommendations.monitoring))
    .bind(Json(&recommendations.referrals))
    .bind(Json(&recommendations.urgent_actions))
    .bind(record.updated_at.timestamp_millis())
    .bind(&record.id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_by_email<'e, E>(
    executor: E,
    email: &str,
) -> Result<Option<PatientRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, PatientRecord>(&format!(
        "SELECT {} FROM patients WHERE email = ?",
        COLUMNS
    ))
    .bind(email)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, id: &str) -> Result<Option<PatientRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, PatientRecord>(&format!("SELECT {} FROM patients WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// First record sharing either the email or the phone number.
pub async fn find_by_email_or_phone<'e, E>(
    executor: E,
    email: &str,
    phone_number: &str,
) -> Result<Option<PatientRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, PatientRecord>(&format!(
        "SELECT {} FROM patients WHERE email = ? OR phone_number = ? LIMIT 1",
        COLUMNS
    ))
    .bind(email)
    .bind(phone_number)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E>(executor: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM patients WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Records owned by a doctor, matched by id or by the snapshotted email.
/// Most recently updated first.
pub async fn list_for_doctor<'e, E>(
    executor: E,
    doctor_id: &str,
    doctor_email: &str,
    limit: i64,
) -> Result<Vec<PatientRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, PatientRecord>(&format!(
        "SELECT {} FROM patients
         WHERE doctor_id = ? OR doctor_email = ?
         ORDER BY updated_at DESC, rowid DESC
         LIMIT ?",
        COLUMNS
    ))
    .bind(doctor_id)
    .bind(doctor_email)
    .bind(limit)
    .fetch_all(executor)
    .await
}

pub async fn list_for_nurse<'e, E>(
    executor: E,
    nurse_email: &str,
    limit: i64,
) -> Result<Vec<PatientRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, PatientRecord>(&format!(
        "SELECT {} FROM patients
         WHERE assigned_nurse_email = ?
         ORDER BY updated_at DESC, rowid DESC
         LIMIT ?",
        COLUMNS
    ))
    .bind(nurse_email)
    .bind(limit)
    .fetch_all(executor)
    .await
}
