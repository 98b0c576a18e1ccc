//! PostgreSQL implementation of every store.
//!
//! Uses runtime-checked sqlx queries mapped through `FromRow`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use std::collections::HashMap;

use crate::models::{
    Listing, ListingImageRow, ListingPatch, ListingRow, NewImage, NewListing, Session, User,
    VerificationCode,
};
use crate::services::stores::{CredentialStore, ListingStore, SessionStore, VerificationCodeStore};
use crate::utils::generate_session_token;

const LISTING_COLUMNS: &str = r#"
    l.id, l.user_id, u.name AS user_name, u.email AS user_email,
    l.product_name, l.product_description, l.price, l.category,
    l.created_at, l.updated_at
"#;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_images(&self, rows: Vec<ListingRow>) -> Result<Vec<Listing>, anyhow::Error> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let images = sqlx::query_as::<_, ListingImageRow>(
            "SELECT id, listing_id, image_data, content_type FROM listing_images \
             WHERE listing_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_listing: HashMap<i64, Vec<ListingImageRow>> = HashMap::new();
        for image in images {
            by_listing.entry(image.listing_id).or_default().push(image);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let images = by_listing.remove(&row.id).unwrap_or_default();
                Listing::from_parts(row, images)
            })
            .collect())
    }
}

async fn insert_images(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    listing_id: i64,
    images: &[NewImage],
) -> Result<(), sqlx::Error> {
    for image in images {
        sqlx::query(
            "INSERT INTO listing_images (listing_id, image_data, content_type) VALUES ($1, $2, $3)",
        )
        .bind(listing_id)
        .bind(&image.data)
        .bind(&image.content_type)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl CredentialStore for Database {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Database health check failed: {}", e))?;
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, anyhow::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, anyhow::Error> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<i64>, anyhow::Error> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_password(
        &self,
        user_id: i64,
        password_hash: &str,
    ) -> Result<(), anyhow::Error> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_verified(&self, user_id: i64) -> Result<(), anyhow::Error> {
        sqlx::query("UPDATE users SET verified = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_contact(
        &self,
        user_id: i64,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET phone = COALESCE($2, phone),
                address = COALESCE($3, address)
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(phone)
        .bind(address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VerificationCodeStore for Database {
    async fn get_code(&self, user_id: i64) -> Result<Option<VerificationCode>, anyhow::Error> {
        Ok(sqlx::query_as::<_, VerificationCode>(
            "SELECT user_id, email, code, expires_at, created_at FROM verification_codes WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn store_code(
        &self,
        user_id: i64,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO verification_codes (user_id, email, code, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET email = EXCLUDED.email,
                code = EXCLUDED.code,
                expires_at = EXCLUDED.expires_at,
                created_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_code(&self, user_id: i64) -> Result<(), anyhow::Error> {
        sqlx::query("DELETE FROM verification_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn create_session(&self, user_id: i64) -> Result<String, anyhow::Error> {
        let token = generate_session_token();
        let session = Session::new(&token, user_id);

        sqlx::query("INSERT INTO sessions (token_hash, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(&session.token_hash)
            .bind(session.user_id)
            .bind(session.created_at)
            .execute(&self.pool)
            .await?;

        Ok(token)
    }

    async fn validate_session(&self, token: &str, user_id: i64) -> Result<bool, anyhow::Error> {
        let valid: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE token_hash = $1 AND user_id = $2)",
        )
        .bind(Session::hash_token(token))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(valid)
    }

    async fn delete_all_sessions(&self, user_id: i64) -> Result<(), anyhow::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(user_id, removed = result.rows_affected(), "Sessions deleted");
        Ok(())
    }
}

#[async_trait]
impl ListingStore for Database {
    async fn list_excluding_user(&self, user_id: i64) -> Result<Vec<Listing>, anyhow::Error> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings l JOIN users u ON u.id = l.user_id \
             WHERE l.user_id <> $1 ORDER BY l.created_at DESC, l.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.with_images(rows).await
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Listing>, anyhow::Error> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings l JOIN users u ON u.id = l.user_id \
             WHERE l.user_id = $1 ORDER BY l.created_at DESC, l.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.with_images(rows).await
    }

    async fn create_listing(
        &self,
        user_id: i64,
        listing: NewListing,
        images: Vec<NewImage>,
    ) -> Result<i64, anyhow::Error> {
        let mut tx = self.pool.begin().await?;

        let listing_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO listings (user_id, product_name, product_description, price, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&listing.product_name)
        .bind(&listing.product_description)
        .bind(listing.price)
        .bind(&listing.category)
        .fetch_one(&mut *tx)
        .await?;

        insert_images(&mut tx, listing_id, &images).await?;
        tx.commit().await?;

        Ok(listing_id)
    }

    async fn find_owner(&self, listing_id: i64) -> Result<Option<i64>, anyhow::Error> {
        Ok(
            sqlx::query_scalar("SELECT user_id FROM listings WHERE id = $1")
                .bind(listing_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_listing(
        &self,
        listing_id: i64,
        patch: ListingPatch,
    ) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            UPDATE listings
            SET product_name = COALESCE($2, product_name),
                product_description = COALESCE($3, product_description),
                price = COALESCE($4, price),
                category = COALESCE($5, category),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(listing_id)
        .bind(patch.product_name)
        .bind(patch.product_description)
        .bind(patch.price)
        .bind(patch.category)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_images(
        &self,
        listing_id: i64,
        images: Vec<NewImage>,
    ) -> Result<(), anyhow::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM listing_images WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
        insert_images(&mut tx, listing_id, &images).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_listing(&self, listing_id: i64) -> Result<bool, anyhow::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM listing_images WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
