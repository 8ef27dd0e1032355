//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use farmstand_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    is_admin: bool,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            is_admin: row.is_admin,
            street: row.street.unwrap_or_default(),
            city: row.city.unwrap_or_default(),
            state: row.state.unwrap_or_default(),
            zip: row.zip.unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, is_admin, street, city, state, zip, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, is_admin, street, city, state, zip, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user with email, display name, and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, is_admin, street, city, state, zip, created_at
            ",
        )
        .bind(email.as_str())
        .bind(name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserPasswordRow>(
            r"
            SELECT id, email, name, is_admin, street, city, state, zip, created_at,
                   password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let password_hash = r.password_hash.clone();
        let user = User::try_from(r.into_user_row())?;

        Ok(Some((user, password_hash)))
    }

    /// Update a user's display name and profile address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        street: &str,
        city: &str,
        state: &str,
        zip: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET name = $2, street = $3, city = $4, state = $5, zip = $6
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(name)
        .bind(street)
        .bind(city)
        .bind(state)
        .bind(zip)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Internal row type for the login query (user columns plus the hash).
#[derive(Debug, sqlx::FromRow)]
struct UserPasswordRow {
    id: i32,
    email: String,
    name: String,
    is_admin: bool,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    created_at: DateTime<Utc>,
    password_hash: String,
}

impl UserPasswordRow {
    fn into_user_row(self) -> UserRow {
        UserRow {
            id: self.id,
            email: self.email,
            name: self.name,
            is_admin: self.is_admin,
            street: self.street,
            city: self.city,
            state: self.state,
            zip: self.zip,
            created_at: self.created_at,
        }
    }
}
