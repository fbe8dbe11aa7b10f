// src/db/user_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::auth::{User, UserRole},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail (login, fora do contexto de organização)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list_by_organization<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
    ) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE organization_id = $1 ORDER BY created_at ASC",
        )
            .bind(organization_id)
            .fetch_all(executor)
            .await?;
        Ok(users)
    }

    // Cria um novo usuário no banco de dados.
    // E-mail duplicado vira AppError::EmailAlreadyExists.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        email: &str,
        full_name: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (organization_id, email, full_name, password_hash, role)
            VALUES ($1, lower($2), $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(email)
            .bind(full_name)
            .bind(password_hash)
            .bind(role)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, email))
    }
}
