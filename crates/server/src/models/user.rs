//! User model and CRUD operations.

use crate::error::{AppResult, unique_violation};
use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account role, stored as the `user_role` enum in PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parses a role name case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// User record. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user.
#[derive(Debug)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Filters for the administrative user listing.
#[derive(Debug, Default)]
pub struct UserFilters {
    /// Case-insensitive substring matched against name or email.
    pub q: Option<String>,
    pub role: Option<Role>,
    /// `createdAt_desc` (default), `createdAt_asc`, `name_asc` or `name_desc`.
    pub sort: Option<String>,
}

impl User {
    /// Check if this user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> AppResult<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    /// Find a user by email, compared case-insensitively.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> AppResult<Option<Self>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(pool)
                .await
                .context("failed to fetch user by email")?;

        Ok(user)
    }

    /// Create a new user. The password is hashed before storage; a duplicate
    /// email surfaces as `Conflict`.
    pub async fn create(pool: &PgPool, input: CreateUser) -> AppResult<Self> {
        let id = Uuid::now_v7();
        let password = hash_password(&input.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&password)
        .bind(input.role)
        .fetch_one(pool)
        .await
        .map_err(unique_violation("Email already exists."))?;

        Ok(user)
    }

    /// Set the account role, returning the updated row.
    pub async fn set_role(pool: &PgPool, id: Uuid, role: Role) -> AppResult<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(role)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update user role")?;

        Ok(user)
    }

    /// List users with optional filtering and ordering.
    pub async fn search(pool: &PgPool, filters: UserFilters) -> AppResult<Vec<Self>> {
        // Build dynamic filter query
        let mut query = String::from("SELECT * FROM users");
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx = 1;

        let pattern = filters.q.as_ref().map(|q| format!("%{q}%"));
        if pattern.is_some() {
            conditions.push(format!(
                "(name ILIKE ${param_idx} OR email ILIKE ${param_idx})"
            ));
            param_idx += 1;
        }
        if filters.role.is_some() {
            conditions.push(format!("role = ${param_idx}"));
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        // Unknown sort values fall back to newest-first.
        let order = match filters.sort.as_deref() {
            Some("createdAt_asc") => "created_at ASC, id ASC",
            Some("name_asc") => "name ASC",
            Some("name_desc") => "name DESC",
            _ => "created_at DESC, id DESC",
        };
        query.push_str(" ORDER BY ");
        query.push_str(order);

        let mut query_builder = sqlx::query_as::<_, User>(&query);
        if let Some(ref pattern) = pattern {
            query_builder = query_builder.bind(pattern);
        }
        if let Some(role) = filters.role {
            query_builder = query_builder.bind(role);
        }

        let users = query_builder
            .fetch_all(pool)
            .await
            .context("failed to list users")?;

        Ok(users)
    }

    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.password.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.password) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
