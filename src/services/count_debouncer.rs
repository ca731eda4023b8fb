use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::db::trader_repo;
use crate::explorer::TraderQuery;

/// Source of trader counts for a query.
#[async_trait]
pub trait TraderCounter: Send + Sync {
    async fn count(&self, query: &TraderQuery) -> anyhow::Result<i64>;
}

#[async_trait]
impl TraderCounter for PgPool {
    async fn count(&self, query: &TraderQuery) -> anyhow::Result<i64> {
        trader_repo::count_traders(self, query).await
    }
}

/// Count result for the query received as number `generation` in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountUpdate {
    pub generation: u64,
    pub total: i64,
}

/// Debounce queries from `rx` and emit counts on `tx`.
///
/// Flow:
/// 1. Wait for a query; every newer query within `window` replaces it
/// 2. Once `window` passes without a newer query, run the count
/// 3. If a newer query arrived while counting, drop the result and go to 1
/// 4. Otherwise emit a `CountUpdate`; failed counts emit nothing
///
/// Ends when `rx` closes (after flushing a pending query) or `tx` is dropped.
pub async fn run_count_debouncer<C>(
    mut rx: mpsc::Receiver<TraderQuery>,
    source: C,
    window: Duration,
    tx: mpsc::Sender<CountUpdate>,
) where
    C: TraderCounter,
{
    let mut generation: u64 = 0;
    let mut carried: Option<TraderQuery> = None;

    loop {
        let mut pending = match carried.take() {
            Some(query) => query,
            None => match rx.recv().await {
                Some(query) => {
                    generation += 1;
                    query
                }
                None => break,
            },
        };

        let mut closed = false;
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(query) => {
                        generation += 1;
                        pending = query;
                    }
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = sleep(window) => break,
            }
        }

        let result = source.count(&pending).await;

        if let Ok(newer) = rx.try_recv() {
            generation += 1;
            counter!("stale_counts_dropped_total").increment(1);
            tracing::debug!(generation, "Dropping stale trader count");
            carried = Some(newer);
            continue;
        }

        match result {
            Ok(total) => {
                if tx.send(CountUpdate { generation, total }).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, generation, "Trader count failed");
            }
        }

        if closed {
            break;
        }
    }

    tracing::debug!(generation, "Count debouncer stopped");
}
