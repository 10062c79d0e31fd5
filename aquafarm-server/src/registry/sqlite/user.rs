use aquafarm_core::{DomainError, User, UserId};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::registry::{RegistryError, UserRegistry};

use super::{parse_timestamp, parse_ulid};

#[derive(Clone)]
pub struct SqliteUserRegistry {
    pool: SqlitePool,
}

impl SqliteUserRegistry {
    pub async fn new(path: impl AsRef<std::path::Path>) -> Result<Self, RegistryError> {
        let pool = super::connect(path).await?;
        Ok(Self { pool })
    }

    pub async fn new_in_memory() -> Result<Self, RegistryError> {
        let pool = super::connect_in_memory().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRegistry for SqliteUserRegistry {
    async fn create_user(&self, user: User) -> Result<(), RegistryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id.0.to_string())
        .bind(&*user.name)
        .bind(&*user.email)
        .bind(&*user.password_hash)
        .bind(user.created_at.as_second())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::duplicate("user", &*user.email).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RegistryError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_user(&r)).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RegistryError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_user(&r)).transpose()
    }
}

fn map_row_to_user(r: &sqlx::sqlite::SqliteRow) -> Result<User, RegistryError> {
    Ok(User {
        id: UserId(parse_ulid(r.try_get("id")?)?),
        name: r.try_get::<String, _>("name")?.into(),
        email: r.try_get::<String, _>("email")?.into(),
        password_hash: r.try_get::<String, _>("password_hash")?.into(),
        created_at: parse_timestamp(r.try_get("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use aquafarm_core::{DomainError, User, UserId};
    use jiff::Timestamp;
    use ulid::Ulid;

    use crate::registry::{RegistryError, UserRegistry};

    use super::SqliteUserRegistry;

    fn user(email: &str) -> User {
        User {
            id: UserId(Ulid::new()),
            name: "Ana".into(),
            email: email.into(),
            password_hash: "$2b$12$hash".into(),
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn create_and_find_by_email() {
        let registry = SqliteUserRegistry::new_in_memory().await.unwrap();
        let ana = user("ana@example.com");

        registry.create_user(ana.clone()).await.unwrap();

        let fetched = registry
            .find_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, ana.id);
        assert_eq!(&*fetched.password_hash, "$2b$12$hash");

        assert!(registry.get_user(ana.id).await.unwrap().is_some());
        assert!(
            registry
                .find_by_email("nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let registry = SqliteUserRegistry::new_in_memory().await.unwrap();

        registry.create_user(user("ana@example.com")).await.unwrap();
        let err = registry
            .create_user(user("ana@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Domain(DomainError::DuplicateKey { .. })
        ));
    }
}
