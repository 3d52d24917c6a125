//! Account queries

use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::models::{now, Account, AccountStatus, NewAccount, Role};

const COLUMNS: &str =
    "id, username, email, password_hash, role, status, phone_number, created_at, updated_at";

pub async fn insert<'e, E>(executor: E, account: &NewAccount) -> Result<Account, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = now();
    let created = Account {
        id: Uuid::new_v4().to_string(),
        username: account.username.clone(),
        email: account.email.clone(),
        password_hash: account.password_hash.clone(),
        role: account.role,
        status: AccountStatus::Active,
        phone_number: None,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO accounts (
            id, username, email, password_hash, role, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&created.id)
    .bind(&created.username)
    .bind(&created.email)
    .bind(&created.password_hash)
    .bind(created.role)
    .bind(created.status)
    .bind(now.timestamp_millis())
    .bind(now.timestamp_millis())
    .execute(executor)
    .await?;

    Ok(created)
}

pub async fn find_by_id<'e, E>(executor: E, id: &str) -> Result<Option<Account>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Account>(&format!("SELECT {} FROM accounts WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Account>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Account>(&format!("SELECT {} FROM accounts WHERE email = ?", COLUMNS))
        .bind(email)
        .fetch_optional(executor)
        .await
}

/// Account with this email *and* this role, e.g. the nurse a patient is
/// assigned to.
pub async fn find_by_email_and_role<'e, E>(
    executor: E,
    email: &str,
    role: Role,
) -> Result<Option<Account>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {} FROM accounts WHERE email = ? AND role = ?",
        COLUMNS
    ))
    .bind(email)
    .bind(role)
    .fetch_optional(executor)
    .await
}

/// Newest-created first.
pub async fn list<'e, E>(executor: E, limit: i64) -> Result<Vec<Account>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {} FROM accounts ORDER BY created_at DESC, rowid DESC LIMIT ?",
        COLUMNS
    ))
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Returns the updated account, or `None` when no account has this id.
pub async fn update_access<'e, E>(
    executor: E,
    id: &str,
    role: Role,
    status: Option<AccountStatus>,
) -> Result<Option<Account>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Account>(&format!(
        "UPDATE accounts
         SET role = ?, status = COALESCE(?, status), updated_at = ?
         WHERE id = ?
         RETURNING {}",
        COLUMNS
    ))
    .bind(role)
    .bind(status)
    .bind(now().timestamp_millis())
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E>(executor: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Copy a patient's contact details onto the account that shares the
/// patient's previous email. Returns whether such an account existed.
pub async fn sync_contact<'e, E>(
    executor: E,
    old_email: &str,
    email: &str,
    username: &str,
    phone_number: &str,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE accounts
         SET email = ?, username = ?, phone_number = ?, updated_at = ?
         WHERE email = ?",
    )
    .bind(email)
    .bind(username)
    .bind(phone_number)
    .bind(now().timestamp_millis())
    .bind(old_email)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::is_unique_violation;

    fn new_account(email: &str, role: Role) -> NewAccount {
        NewAccount {
            username: "someone".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
        }
    }

    #[actix_web::test]
    async fn email_is_unique() {
        let db = Database::in_memory().await.unwrap();
        insert(db.pool(), &new_account("a@x.com", Role::User)).await.unwrap();
        let err = insert(db.pool(), &new_account("a@x.com", Role::Doctor))
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[actix_web::test]
    async fn role_lookup_requires_matching_role() {
        let db = Database::in_memory().await.unwrap();
        insert(db.pool(), &new_account("n@x.com", Role::User)).await.unwrap();
        assert!(find_by_email_and_role(db.pool(), "n@x.com", Role::Nurse)
            .await
            .unwrap()
            .is_none());
        assert!(find_by_email_and_role(db.pool(), "n@x.com", Role::User)
            .await
            .unwrap()
            .is_some());
    }

    #[actix_web::test]
    async fn list_is_newest_first() {
        let db = Database::in_memory().await.unwrap();
        for email in ["1@x.com", "2@x.com", "3@x.com"] {
            insert(db.pool(), &new_account(email, Role::User)).await.unwrap();
        }
        let emails: Vec<String> = list(db.pool(), 2)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.email)
            .collect();
        assert_eq!(emails, vec!["3@x.com", "2@x.com"]);
    }

    #[actix_web::test]
    async fn update_access_keeps_status_when_absent() {
        let db = Database::in_memory().await.unwrap();
        let account = insert(db.pool(), &new_account("a@x.com", Role::User)).await.unwrap();

        let updated = update_access(db.pool(), &account.id, Role::Nurse, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, Role::Nurse);
        assert_eq!(updated.status, AccountStatus::Active);

        assert!(update_access(db.pool(), "missing", Role::Nurse, None)
            .await
            .unwrap()
            .is_none());
    }

    #[actix_web::test]
    async fn schema_rejects_unknown_role() {
        let db = Database::in_memory().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO accounts (id, username, email, password_hash, role, created_at, updated_at)
             VALUES ('x', 'u', 'u@x.com', 'h', 'root', 0, 0)",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }
}
