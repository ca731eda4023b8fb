use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::PgPool;

use crate::db::explorer_state_repo;
use crate::filters::ConditionRow;
use crate::models::LayoutState;

use super::params::FilterTab;

const LAYOUT_SLOT: &str = "layout";

fn filters_slot(tab: FilterTab) -> String {
    format!("filters:{tab}")
}

fn decode<T: DeserializeOwned>(payload: &str) -> anyhow::Result<T> {
    Ok(serde_json::from_str(payload)?)
}

/// Persistence for explorer state that must survive without URL state:
/// the last applied rows per tab and the layout blob. Keyed by client.
#[async_trait]
pub trait FilterStateStore: Send + Sync {
    async fn load(&self, client: &str, tab: FilterTab) -> anyhow::Result<Option<Vec<ConditionRow>>>;

    async fn save(&self, client: &str, tab: FilterTab, rows: &[ConditionRow]) -> anyhow::Result<()>;

    async fn load_layout(&self, client: &str) -> anyhow::Result<Option<LayoutState>>;

    async fn save_layout(&self, client: &str, layout: &LayoutState) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Store backed by a process-local map. Payloads are kept as JSON text, the
/// same shape the Postgres store writes.
#[derive(Debug, Default)]
pub struct InMemoryFilterStateStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl InMemoryFilterStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, client: &str, slot: &str) -> anyhow::Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("filter state lock poisoned"))?;
        Ok(entries.get(&(client.to_string(), slot.to_string())).cloned())
    }

    fn put(&self, client: &str, slot: String, payload: String) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("filter state lock poisoned"))?;
        entries.insert((client.to_string(), slot), payload);
        Ok(())
    }
}

#[async_trait]
impl FilterStateStore for InMemoryFilterStateStore {
    async fn load(&self, client: &str, tab: FilterTab) -> anyhow::Result<Option<Vec<ConditionRow>>> {
        self.get(client, &filters_slot(tab))?
            .map(|payload| decode(&payload))
            .transpose()
    }

    async fn save(&self, client: &str, tab: FilterTab, rows: &[ConditionRow]) -> anyhow::Result<()> {
        self.put(client, filters_slot(tab), serde_json::to_string(rows)?)
    }

    async fn load_layout(&self, client: &str) -> anyhow::Result<Option<LayoutState>> {
        self.get(client, LAYOUT_SLOT)?
            .map(|payload| decode(&payload))
            .transpose()
    }

    async fn save_layout(&self, client: &str, layout: &LayoutState) -> anyhow::Result<()> {
        self.put(client, LAYOUT_SLOT.to_string(), serde_json::to_string(layout)?)
    }
}

// ---------------------------------------------------------------------------
// Postgres store
// ---------------------------------------------------------------------------

/// Store backed by the `explorer_state` table.
#[derive(Debug, Clone)]
pub struct PgFilterStateStore {
    pool: PgPool,
}

impl PgFilterStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FilterStateStore for PgFilterStateStore {
    async fn load(&self, client: &str, tab: FilterTab) -> anyhow::Result<Option<Vec<ConditionRow>>> {
        explorer_state_repo::get_payload(&self.pool, client, &filters_slot(tab))
            .await?
            .map(|payload| decode(&payload))
            .transpose()
    }

    async fn save(&self, client: &str, tab: FilterTab, rows: &[ConditionRow]) -> anyhow::Result<()> {
        let payload = serde_json::to_string(rows)?;
        explorer_state_repo::upsert_payload(&self.pool, client, &filters_slot(tab), &payload).await
    }

    async fn load_layout(&self, client: &str) -> anyhow::Result<Option<LayoutState>> {
        explorer_state_repo::get_payload(&self.pool, client, LAYOUT_SLOT)
            .await?
            .map(|payload| decode(&payload))
            .transpose()
    }

    async fn save_layout(&self, client: &str, layout: &LayoutState) -> anyhow::Result<()> {
        let payload = serde_json::to_string(layout)?;
        explorer_state_repo::upsert_payload(&self.pool, client, LAYOUT_SLOT, &payload).await
    }
}
