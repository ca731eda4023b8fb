use std::time::Instant;

use metrics::{counter, histogram};
use sqlx::PgPool;

use crate::explorer::TraderQuery;
use crate::models::Trader;

/// Fetch one page of traders matching the query.
pub async fn search_traders(pool: &PgPool, query: &TraderQuery) -> anyhow::Result<Vec<Trader>> {
    let started = Instant::now();

    let mut qb = query.search_sql();
    let traders = qb.build_query_as::<Trader>().fetch_all(pool).await?;

    counter!("trader_searches_total").increment(1);
    histogram!("trader_query_latency_seconds", "kind" => "search")
        .record(started.elapsed().as_secs_f64());

    Ok(traders)
}

/// Count all traders matching the query, ignoring pagination.
pub async fn count_traders(pool: &PgPool, query: &TraderQuery) -> anyhow::Result<i64> {
    let started = Instant::now();

    let mut qb = query.count_sql();
    let total = qb.build_query_scalar::<i64>().fetch_one(pool).await?;

    counter!("trader_counts_total").increment(1);
    histogram!("trader_query_latency_seconds", "kind" => "count")
        .record(started.elapsed().as_secs_f64());

    Ok(total)
}

/// Fetch a trader by account address.
pub async fn get_trader_by_account(pool: &PgPool, account: &str) -> anyhow::Result<Option<Trader>> {
    let trader = sqlx::query_as::<_, Trader>(
        "SELECT * FROM traders WHERE account = $1 ORDER BY pnl DESC LIMIT 1",
    )
    .bind(account)
    .fetch_optional(pool)
    .await?;

    Ok(trader)
}
