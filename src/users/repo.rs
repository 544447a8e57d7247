use crate::users::repo_types::{NewUser, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, surname, dni, cuil_cuit, email, phone, guests, \
                            password_hash, active, is_admin, created_at";

impl User {
    /// Find a user by email, ignoring case.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by national id.
    pub async fn find_by_dni(db: &PgPool, dni: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE dni = $1"
        ))
        .bind(dni)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Active user by id; inactive accounts are treated as missing.
    pub async fn find_active(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(Self::find_by_id(db, id).await?.filter(|u| u.active))
    }

    /// Create a new user with hashed password.
    pub async fn create(db: &PgPool, new: &NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, surname, dni, cuil_cuit, email, phone, guests, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.surname)
        .bind(&new.dni)
        .bind(&new.cuil_cuit)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.guests)
        .bind(&new.password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE active = true ORDER BY created_at, id"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Whether another active user already owns `email`.
    pub async fn email_taken_by_other(
        db: &PgPool,
        email: &str,
        except: Uuid,
    ) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE lower(email) = lower($1) AND active = true AND id <> $2
            )
            "#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(db)
        .await?;
        Ok(taken)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: &str,
        surname: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET name = $2, surname = $3, email = $4
            WHERE id = $1 AND active = true
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(surname)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Soft delete. Returns false when the user was already inactive or missing.
    pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE users SET active = false WHERE id = $1 AND active = true")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
