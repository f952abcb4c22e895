//! Directory Repository
//!
//! Name lookups for clients and connections. Their lifecycle is owned
//! elsewhere; the control plane only reads them.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{Directory, PgStore, Result};

#[async_trait]
impl Directory for PgStore {
    async fn client_names(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT id, name FROM clients WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn connection_names(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT id, name FROM connections WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
