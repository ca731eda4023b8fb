use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::config::AppConfig;
use crate::errors::ExplorerError;
use crate::filters::{
    dedup_rows, default_filters, parse_list, parse_params, stringify_list, stringify_params,
    ConditionRow,
};
use crate::models::LayoutState;

use super::params::{
    FilterTab, QueryParams, FILTER_TAB_PARAM, IF_LABELS_PARAM, LABELS_PARAM, LIMIT_PARAM,
    PAGE_PARAM,
};
use super::query::TraderQuery;
use super::store::FilterStateStore;

/// Pagination and default-filter settings.
#[derive(Debug, Clone, Copy)]
pub struct ExplorerSettings {
    pub default_limit: u32,
    pub max_limit: u32,
    pub last_trade_days: i64,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            last_trade_days: 7,
        }
    }
}

impl From<&AppConfig> for ExplorerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_limit: config.default_page_limit,
            max_limit: config.max_page_limit,
            last_trade_days: config.default_last_trade_days,
        }
    }
}

/// Serializable view of the resolved explorer state.
#[derive(Debug, Clone, Serialize)]
pub struct ExplorerState {
    pub tab: FilterTab,
    pub filters: Vec<ConditionRow>,
    pub ranking: Vec<ConditionRow>,
    pub labels: Vec<String>,
    pub if_labels: Vec<String>,
    pub page: u32,
    pub limit: u32,
    /// Query string to navigate to.
    pub query: String,
}

/// Decoded filter state of one explorer view, bound to its URL query
/// state and the client's persisted state.
///
/// Every change rewrites the whole row list of a tab, re-encodes it into
/// that tab's parameter, clears the parameters of every other mode and
/// resets pagination.
pub struct FilterContext {
    client: String,
    store: Arc<dyn FilterStateStore>,
    settings: ExplorerSettings,
    params: QueryParams,
    tab: FilterTab,
    filters: Vec<ConditionRow>,
    ranking: Vec<ConditionRow>,
    labels: Vec<String>,
    if_labels: Vec<String>,
    page: u32,
    limit: u32,
}

impl FilterContext {
    /// Resolve state from `params`. For each filter tab the URL wins, then the
    /// client's stored rows, then the tab default.
    pub async fn load(
        params: QueryParams,
        client: impl Into<String>,
        store: Arc<dyn FilterStateStore>,
        settings: ExplorerSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let client = client.into();

        let tab = params
            .get(FILTER_TAB_PARAM)
            .and_then(FilterTab::from_str)
            .unwrap_or_default();

        let filters = resolve_rows(&params, FilterTab::Default, &client, store.as_ref())
            .await
            .unwrap_or_else(|| default_filters(now, settings.last_trade_days));
        let ranking = resolve_rows(&params, FilterTab::Ranking, &client, store.as_ref())
            .await
            .unwrap_or_default();

        let labels = params
            .get_non_empty(LABELS_PARAM)
            .map(parse_list)
            .unwrap_or_default();
        let if_labels = params
            .get_non_empty(IF_LABELS_PARAM)
            .map(parse_list)
            .unwrap_or_default();

        let page = parse_positive(params.get(PAGE_PARAM)).unwrap_or(1);
        let limit = clamp_limit(
            parse_positive(params.get(LIMIT_PARAM)).unwrap_or(settings.default_limit),
            settings.max_limit,
        );

        Self {
            client,
            store,
            settings,
            params,
            tab,
            filters,
            ranking,
            labels,
            if_labels,
            page,
            limit,
        }
    }

    // -- Accessors ---------------------------------------------------------

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn tab(&self) -> FilterTab {
        self.tab
    }

    pub fn filters(&self) -> &[ConditionRow] {
        &self.filters
    }

    pub fn ranking(&self) -> &[ConditionRow] {
        &self.ranking
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn if_labels(&self) -> &[String] {
        &self.if_labels
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows of the active tab; empty on the labels tab.
    pub fn active_rows(&self) -> &[ConditionRow] {
        match self.tab {
            FilterTab::Default => &self.filters,
            FilterTab::Ranking => &self.ranking,
            FilterTab::Labels => &[],
        }
    }

    pub fn trader_query(&self) -> TraderQuery {
        TraderQuery {
            tab: self.tab,
            filters: self.active_rows().to_vec(),
            labels: self.labels.clone(),
            if_labels: self.if_labels.clone(),
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn snapshot(&self) -> ExplorerState {
        ExplorerState {
            tab: self.tab,
            filters: self.filters.clone(),
            ranking: self.ranking.clone(),
            labels: self.labels.clone(),
            if_labels: self.if_labels.clone(),
            page: self.page,
            limit: self.limit,
            query: self.params.to_query_string(),
        }
    }

    // -- Changes -----------------------------------------------------------

    /// Replace the rows of `tab` and make it the active mode.
    pub async fn change_filters(
        &mut self,
        rows: Vec<ConditionRow>,
        tab: FilterTab,
    ) -> Result<(), ExplorerError> {
        let slot = tab.filter_param().ok_or(ExplorerError::NoFilterSlot(tab))?;

        let rows = dedup_rows(rows);
        let encoded = stringify_params(&rows);

        self.activate(tab);
        self.params.set(slot, Some(encoded).filter(|s| !s.is_empty()));
        if tab == FilterTab::Ranking {
            self.ranking = rows;
        } else {
            self.filters = rows;
        }

        counter!("filter_changes_total", "tab" => tab.as_str()).increment(1);
        tracing::debug!(
            client = %self.client,
            tab = %tab,
            rows = self.active_rows().len(),
            "Filters changed"
        );

        // The URL change stands even if persisting fails.
        if let Err(e) = self.store.save(&self.client, tab, self.active_rows()).await {
            tracing::warn!(
                error = %e,
                client = %self.client,
                tab = %tab,
                "Failed to persist filter state"
            );
        }

        Ok(())
    }

    /// Switch mode without touching the new tab's rows.
    pub fn change_tab(&mut self, tab: FilterTab) {
        self.activate(tab);
    }

    /// Activate the labels mode with the given lists.
    pub fn change_labels(&mut self, labels: Vec<String>, if_labels: Vec<String>) {
        self.activate(FilterTab::Labels);

        let labels: Vec<String> = labels.into_iter().filter(|l| !l.is_empty()).collect();
        let if_labels: Vec<String> = if_labels.into_iter().filter(|l| !l.is_empty()).collect();

        self.params
            .set(LABELS_PARAM, non_empty(stringify_list(&labels)));
        self.params
            .set(IF_LABELS_PARAM, non_empty(stringify_list(&if_labels)));
        self.labels = labels;
        self.if_labels = if_labels;

        counter!("filter_changes_total", "tab" => FilterTab::Labels.as_str()).increment(1);
    }

    pub fn change_page(&mut self, page: u32) {
        self.page = page.max(1);
        self.params.set(PAGE_PARAM, Some(self.page.to_string()));
    }

    /// Change the page size; pagination restarts at page 1.
    pub fn change_limit(&mut self, limit: u32) {
        self.limit = clamp_limit(limit, self.settings.max_limit);
        self.params.set(LIMIT_PARAM, Some(self.limit.to_string()));
        self.change_page(1);
    }

    /// Stored layout, or the default when none is stored or it cannot be read.
    pub async fn load_layout(&self) -> LayoutState {
        match self.store.load_layout(&self.client).await {
            Ok(layout) => layout.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, client = %self.client, "Failed to load layout state");
                LayoutState::default()
            }
        }
    }

    pub async fn save_layout(&self, layout: &LayoutState) -> Result<(), ExplorerError> {
        if !layout.is_valid() {
            return Err(ExplorerError::InvalidLayout);
        }
        self.store.save_layout(&self.client, layout).await?;
        Ok(())
    }

    /// Make `tab` the active mode: drop every other mode's parameters and
    /// restart pagination.
    fn activate(&mut self, tab: FilterTab) {
        for other in FilterTab::ALL.into_iter().filter(|t| *t != tab) {
            for param in other.owned_params() {
                self.params.remove(param);
            }
        }
        if tab != FilterTab::Labels {
            self.labels.clear();
            self.if_labels.clear();
        }

        self.tab = tab;
        self.params
            .set(FILTER_TAB_PARAM, Some(tab.as_str().to_string()));
        self.change_page(1);
    }
}

async fn resolve_rows(
    params: &QueryParams,
    tab: FilterTab,
    client: &str,
    store: &dyn FilterStateStore,
) -> Option<Vec<ConditionRow>> {
    if let Some(encoded) = tab.filter_param().and_then(|p| params.get_non_empty(p)) {
        return Some(parse_params(Some(encoded)));
    }

    match store.load(client, tab).await {
        Ok(rows) => rows.map(dedup_rows),
        Err(e) => {
            tracing::warn!(error = %e, client, tab = %tab, "Failed to load stored filters");
            None
        }
    }
}

fn parse_positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
}

/// Page size within `1..=max`, even when `max` is configured as 0.
fn clamp_limit(limit: u32, max: u32) -> u32 {
    limit.clamp(1, max.max(1))
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::params::{FILTER_PARAM, RANKING_PARAM};
    use crate::explorer::store::InMemoryFilterStateStore;
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap()
    }

    async fn load(query: &str, store: Arc<dyn FilterStateStore>) -> FilterContext {
        FilterContext::load(
            QueryParams::parse(query),
            "alice",
            store,
            ExplorerSettings::default(),
            now(),
        )
        .await
    }

    struct FailingStore;

    #[async_trait]
    impl FilterStateStore for FailingStore {
        async fn load(&self, _: &str, _: FilterTab) -> anyhow::Result<Option<Vec<ConditionRow>>> {
            anyhow::bail!("store offline")
        }
        async fn save(&self, _: &str, _: FilterTab, _: &[ConditionRow]) -> anyhow::Result<()> {
            anyhow::bail!("store offline")
        }
        async fn load_layout(&self, _: &str) -> anyhow::Result<Option<LayoutState>> {
            anyhow::bail!("store offline")
        }
        async fn save_layout(&self, _: &str, _: &LayoutState) -> anyhow::Result<()> {
            anyhow::bail!("store offline")
        }
    }

    #[tokio::test]
    async fn test_load_from_url() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        let ctx = load(
            "filter=pnl__gte__100___pnl__lte__5&filterTab=default&page=3&limit=50",
            store,
        )
        .await;

        assert_eq!(ctx.tab(), FilterTab::Default);
        assert_eq!(ctx.filters(), &[ConditionRow::gte("pnl", 100.0)]);
        assert_eq!(ctx.page(), 3);
        assert_eq!(ctx.limit(), 50);
    }

    #[tokio::test]
    async fn test_load_falls_back_to_store_then_defaults() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        store
            .save("alice", FilterTab::Ranking, &[ConditionRow::gte("winRate", 80.0)])
            .await
            .unwrap();

        let ctx = load("", store).await;
        assert_eq!(ctx.ranking(), &[ConditionRow::gte("winRate", 80.0)]);
        assert_eq!(ctx.filters(), default_filters(now(), 7).as_slice());
        assert_eq!(ctx.page(), 1);
        assert_eq!(ctx.limit(), 20);
    }

    #[tokio::test]
    async fn test_stored_empty_list_suppresses_defaults() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        store.save("alice", FilterTab::Default, &[]).await.unwrap();

        let ctx = load("", store).await;
        assert!(ctx.filters().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_defaults() {
        let ctx = load("", Arc::new(FailingStore)).await;
        assert_eq!(ctx.filters(), default_filters(now(), 7).as_slice());
        assert!(ctx.ranking().is_empty());
        assert_eq!(ctx.load_layout().await, LayoutState::default());
    }

    #[tokio::test]
    async fn test_limit_is_capped() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        let ctx = load("limit=5000&page=0", store).await;
        assert_eq!(ctx.limit(), 100);
        assert_eq!(ctx.page(), 1);
    }

    #[tokio::test]
    async fn test_limit_never_zero() {
        let settings = ExplorerSettings {
            default_limit: 0,
            max_limit: 0,
            last_trade_days: 7,
        };
        for query in ["", "limit=5"] {
            let mut ctx = FilterContext::load(
                QueryParams::parse(query),
                "alice",
                Arc::new(InMemoryFilterStateStore::new()),
                settings,
                now(),
            )
            .await;
            assert_eq!(ctx.limit(), 1, "query = {query:?}");

            ctx.change_limit(50);
            assert_eq!(ctx.limit(), 1);
        }
    }

    #[tokio::test]
    async fn test_change_filters_writes_one_slot() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        let mut ctx = load(
            "ranking=pnl__gte__50&labels=whale&ifLabels=degen&filterTab=labels&page=4&limit=10",
            store.clone(),
        )
        .await;

        ctx.change_filters(
            vec![
                ConditionRow::gte("pnl", 100.0),
                ConditionRow::lte("pnl", 1.0),
                ConditionRow::between("winRate", 10.0, 90.0),
            ],
            FilterTab::Default,
        )
        .await
        .unwrap();

        let params = ctx.params();
        assert_eq!(
            params.get(FILTER_PARAM),
            Some("pnl__gte__100___winRate__between__10__90")
        );
        assert_eq!(params.get(RANKING_PARAM), None);
        assert_eq!(params.get(LABELS_PARAM), None);
        assert_eq!(params.get(IF_LABELS_PARAM), None);
        assert_eq!(params.get(FILTER_TAB_PARAM), Some("default"));
        assert_eq!(params.get(PAGE_PARAM), Some("1"));
        assert_eq!(params.get(LIMIT_PARAM), Some("10"));
        assert!(ctx.labels().is_empty());

        let stored = store.load("alice", FilterTab::Default).await.unwrap().unwrap();
        assert_eq!(
            stored,
            vec![
                ConditionRow::gte("pnl", 100.0),
                ConditionRow::between("winRate", 10.0, 90.0)
            ]
        );
    }

    #[tokio::test]
    async fn test_change_filters_to_empty_removes_slot() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        let mut ctx = load("filter=pnl__gte__1", store).await;

        ctx.change_filters(Vec::new(), FilterTab::Default).await.unwrap();
        assert!(!ctx.params().contains(FILTER_PARAM));
        assert!(ctx.filters().is_empty());
    }

    #[tokio::test]
    async fn test_change_filters_survives_store_failure() {
        let mut ctx = load("", Arc::new(FailingStore)).await;
        ctx.change_filters(vec![ConditionRow::gte("pnl", 1.0)], FilterTab::Ranking)
            .await
            .unwrap();
        assert_eq!(ctx.params().get(RANKING_PARAM), Some("pnl__gte__1"));
        assert_eq!(ctx.tab(), FilterTab::Ranking);
    }

    #[tokio::test]
    async fn test_change_filters_rejects_labels_tab() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        let mut ctx = load("", store).await;
        let err = ctx
            .change_filters(vec![ConditionRow::gte("pnl", 1.0)], FilterTab::Labels)
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::NoFilterSlot(FilterTab::Labels)));
    }

    #[tokio::test]
    async fn test_change_tab_is_mutually_exclusive() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        let mut ctx = load("filter=pnl__gte__1&labels=a_b&page=7", store).await;

        ctx.change_tab(FilterTab::Ranking);
        assert_eq!(ctx.params().to_query_string(), "page=1&filterTab=ranking");
        assert_eq!(ctx.trader_query().tab, FilterTab::Ranking);
    }

    #[tokio::test]
    async fn test_change_labels() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        let mut ctx = load("filter=pnl__gte__1&ranking=pnl__gte__2", store).await;

        ctx.change_labels(vec!["smart_money".into(), String::new()], Vec::new());
        assert_eq!(ctx.params().get(LABELS_PARAM), Some("smart%5Fmoney"));
        assert!(!ctx.params().contains(IF_LABELS_PARAM));
        assert!(!ctx.params().contains(FILTER_PARAM));
        assert!(!ctx.params().contains(RANKING_PARAM));

        let query = ctx.trader_query();
        assert_eq!(query.tab, FilterTab::Labels);
        assert!(query.filters.is_empty());
        assert_eq!(query.labels, vec!["smart_money".to_string()]);

        // The escaped list survives a reload.
        let reloaded = load(
            &ctx.params().to_query_string(),
            Arc::new(InMemoryFilterStateStore::new()),
        )
        .await;
        assert_eq!(reloaded.labels(), &["smart_money".to_string()]);
    }

    #[tokio::test]
    async fn test_pagination_changes() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        let mut ctx = load("page=3", store).await;

        ctx.change_page(0);
        assert_eq!(ctx.page(), 1);
        ctx.change_page(4);
        ctx.change_limit(500);
        assert_eq!(ctx.limit(), 100);
        assert_eq!(ctx.page(), 1);
        assert_eq!(ctx.trader_query().offset(), 0);
    }

    #[tokio::test]
    async fn test_layout_roundtrip_and_validation() {
        let store = Arc::new(InMemoryFilterStateStore::new());
        let ctx = load("", store).await;

        let layout = LayoutState { panels: vec![40.0, 60.0] };
        ctx.save_layout(&layout).await.unwrap();
        assert_eq!(ctx.load_layout().await, layout);

        let err = ctx
            .save_layout(&LayoutState { panels: vec![150.0] })
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidLayout));
    }
}
