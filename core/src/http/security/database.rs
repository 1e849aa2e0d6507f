//! SQL-backed principal store.
//!
//! # Spring Security Equivalent
//! `JdbcUserDetailsManager` with its default schema:
//!
//! ```sql
//! create table users(
//!     username varchar(50) not null primary key,
//!     password varchar(500) not null,
//!     enabled boolean not null);
//! create table authorities (
//!     username varchar(50) not null,
//!     authority varchar(50) not null,
//!     constraint fk_authorities_users foreign key(username) references users(username));
//! create unique index ix_auth_username on authorities (username, authority);
//! ```
//!
//! Queries read columns by position, so replacement queries only need to keep
//! the column order: `username, password, enabled` and `username, authority`.
//!
//! # Example
//! ```rust,ignore
//! let users = DatabaseUserDetailsService::connect("sqlite:beveiligd.db").await?;
//! let joe = users.load_user_by_username("joe").await?;
//! ```

use async_trait::async_trait;
use log::{debug, warn};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::http::security::role::{Role, RoleSet};
use crate::http::security::user::Principal;
use crate::http::security::user_details::{
    UserDetailsError, UserDetailsManager, UserDetailsService,
};

pub const DEF_USERS_BY_USERNAME_QUERY: &str =
    "select username, password, enabled from users where username = ?";
pub const DEF_AUTHORITIES_BY_USERNAME_QUERY: &str =
    "select username, authority from authorities where username = ?";

const CREATE_SCHEMA: [&str; 3] = [
    "create table if not exists users(\
        username varchar(50) not null primary key, \
        password varchar(500) not null, \
        enabled boolean not null)",
    "create table if not exists authorities (\
        username varchar(50) not null, \
        authority varchar(50) not null, \
        constraint fk_authorities_users foreign key(username) references users(username))",
    "create unique index if not exists ix_auth_username on authorities (username, authority)",
];

const INSERT_USER: &str = "insert into users (username, password, enabled) values (?, ?, ?)";
const UPDATE_USER: &str = "update users set password = ?, enabled = ? where username = ?";
const DELETE_USER: &str = "delete from users where username = ?";
const INSERT_AUTHORITY: &str = "insert into authorities (username, authority) values (?, ?)";
const DELETE_AUTHORITIES: &str = "delete from authorities where username = ?";

/// Principal store over an `sqlx` SQLite pool.
#[derive(Debug, Clone)]
pub struct DatabaseUserDetailsService {
    pool: SqlitePool,
    users_by_username_query: String,
    authorities_by_username_query: String,
}

impl DatabaseUserDetailsService {
    /// Opens a pool for `url` and checks that the database answers.
    pub async fn connect(url: &str) -> Result<Self, UserDetailsError> {
        let pool = SqlitePoolOptions::new()
            .connect(url)
            .await
            .map_err(UserDetailsError::storage)?;
        let service = Self::from_pool(pool);
        service.ping().await?;
        Ok(service)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        DatabaseUserDetailsService {
            pool,
            users_by_username_query: DEF_USERS_BY_USERNAME_QUERY.to_string(),
            authorities_by_username_query: DEF_AUTHORITIES_BY_USERNAME_QUERY.to_string(),
        }
    }

    /// Replaces the query loading `username, password, enabled`.
    pub fn users_by_username_query(mut self, query: &str) -> Self {
        self.users_by_username_query = query.to_string();
        self
    }

    /// Replaces the query loading `username, authority`.
    pub fn authorities_by_username_query(mut self, query: &str) -> Self {
        self.authorities_by_username_query = query.to_string();
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), UserDetailsError> {
        sqlx::query("select 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(UserDetailsError::storage)
    }

    /// Creates the default tables when they do not exist yet.
    pub async fn create_schema(&self) -> Result<(), UserDetailsError> {
        for statement in CREATE_SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(UserDetailsError::storage)?;
        }
        Ok(())
    }

    async fn load_roles(&self, username: &str) -> Result<RoleSet, UserDetailsError> {
        let rows = sqlx::query(&self.authorities_by_username_query)
            .bind(username)
            .fetch_all(&self.pool)
            .await
            .map_err(UserDetailsError::storage)?;

        rows.iter()
            .map(|row| {
                let authority: String = row.try_get(1).map_err(UserDetailsError::storage)?;
                Role::new(&authority).map_err(|e| UserDetailsError::InvalidData {
                    username: username.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn insert_roles(
        tx: &mut sqlx::SqliteConnection,
        principal: &Principal,
    ) -> Result<(), UserDetailsError> {
        for role in principal.get_roles() {
            sqlx::query(INSERT_AUTHORITY)
                .bind(principal.get_username())
                .bind(role.as_str())
                .execute(&mut *tx)
                .await
                .map_err(UserDetailsError::storage)?;
        }
        Ok(())
    }
}

fn principal_from_row(row: &SqliteRow) -> Result<Principal, UserDetailsError> {
    let username: String = row.try_get(0).map_err(UserDetailsError::storage)?;
    let password: String = row.try_get(1).map_err(UserDetailsError::storage)?;
    let enabled: bool = row.try_get(2).map_err(UserDetailsError::storage)?;
    Ok(Principal::new(username, password).enabled(enabled))
}

#[async_trait]
impl UserDetailsService for DatabaseUserDetailsService {
    async fn load_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Principal>, UserDetailsError> {
        let row = sqlx::query(&self.users_by_username_query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(UserDetailsError::storage)?;

        let Some(row) = row else {
            debug!("Query returned no results for user '{}'", username);
            return Ok(None);
        };
        let principal = principal_from_row(&row)?;

        let roles = self.load_roles(username).await?;
        if roles.is_empty() {
            warn!("User '{}' has no authorities and will be treated as 'not found'", username);
            return Ok(None);
        }

        Ok(Some(principal.roles(roles)))
    }
}

#[async_trait]
impl UserDetailsManager for DatabaseUserDetailsService {
    async fn create_user(&self, principal: &Principal) -> Result<(), UserDetailsError> {
        if self.user_exists(principal.get_username()).await? {
            return Err(UserDetailsError::AlreadyExists {
                username: principal.get_username().to_string(),
            });
        }

        let mut tx = self.pool.begin().await.map_err(UserDetailsError::storage)?;
        sqlx::query(INSERT_USER)
            .bind(principal.get_username())
            .bind(principal.get_password())
            .bind(principal.is_enabled())
            .execute(&mut *tx)
            .await
            .map_err(UserDetailsError::storage)?;
        Self::insert_roles(&mut tx, principal).await?;
        tx.commit().await.map_err(UserDetailsError::storage)
    }

    async fn update_user(&self, principal: &Principal) -> Result<(), UserDetailsError> {
        let mut tx = self.pool.begin().await.map_err(UserDetailsError::storage)?;
        let updated = sqlx::query(UPDATE_USER)
            .bind(principal.get_password())
            .bind(principal.is_enabled())
            .bind(principal.get_username())
            .execute(&mut *tx)
            .await
            .map_err(UserDetailsError::storage)?;
        if updated.rows_affected() == 0 {
            return Err(UserDetailsError::NotFound {
                username: principal.get_username().to_string(),
            });
        }

        sqlx::query(DELETE_AUTHORITIES)
            .bind(principal.get_username())
            .execute(&mut *tx)
            .await
            .map_err(UserDetailsError::storage)?;
        Self::insert_roles(&mut tx, principal).await?;
        tx.commit().await.map_err(UserDetailsError::storage)
    }

    async fn delete_user(&self, username: &str) -> Result<(), UserDetailsError> {
        let mut tx = self.pool.begin().await.map_err(UserDetailsError::storage)?;
        sqlx::query(DELETE_AUTHORITIES)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(UserDetailsError::storage)?;
        let deleted = sqlx::query(DELETE_USER)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(UserDetailsError::storage)?;
        if deleted.rows_affected() == 0 {
            return Err(UserDetailsError::NotFound {
                username: username.to_string(),
            });
        }
        tx.commit().await.map_err(UserDetailsError::storage)
    }
}
