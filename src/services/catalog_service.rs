use serde::Deserialize;
use sqlx::PgPool;

use super::ServiceError;
use crate::database::models::{Activity, Category, Department, Place, Status, Subcategory};

/// Optional parent/company scoping for catalog lookups
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub id_company: Option<i32>,
    pub id_category: Option<i32>,
    pub id_subcategory: Option<i32>,
}

pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn statuses(&self) -> Result<Vec<Status>, ServiceError> {
        Ok(sqlx::query_as::<_, Status>("SELECT id_status, name, is_final FROM status ORDER BY id_status")
            .fetch_all(&self.pool)
            .await?)
    }

    /// Company-specific rows plus the shared ones (no company)
    pub async fn departments(&self, query: &CatalogQuery) -> Result<Vec<Department>, ServiceError> {
        Ok(sqlx::query_as::<_, Department>(
            r#"
            SELECT id_department, id_company, name FROM departments
            WHERE $1::INTEGER IS NULL OR id_company IS NULL OR id_company = $1
            ORDER BY name
            "#,
        )
        .bind(query.id_company)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn places(&self, query: &CatalogQuery) -> Result<Vec<Place>, ServiceError> {
        Ok(sqlx::query_as::<_, Place>(
            r#"
            SELECT id_place, id_company, name FROM places
            WHERE $1::INTEGER IS NULL OR id_company IS NULL OR id_company = $1
            ORDER BY name
            "#,
        )
        .bind(query.id_company)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(sqlx::query_as::<_, Category>("SELECT id_category, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn subcategories(&self, query: &CatalogQuery) -> Result<Vec<Subcategory>, ServiceError> {
        Ok(sqlx::query_as::<_, Subcategory>(
            r#"
            SELECT id_subcategory, id_category, name FROM subcategories
            WHERE $1::INTEGER IS NULL OR id_category = $1
            ORDER BY name
            "#,
        )
        .bind(query.id_category)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn activities(&self, query: &CatalogQuery) -> Result<Vec<Activity>, ServiceError> {
        Ok(sqlx::query_as::<_, Activity>(
            r#"
            SELECT id_activity, id_subcategory, name FROM activities
            WHERE $1::INTEGER IS NULL OR id_subcategory = $1
            ORDER BY name
            "#,
        )
        .bind(query.id_subcategory)
        .fetch_all(&self.pool)
        .await?)
    }
}
