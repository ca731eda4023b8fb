use sqlx::{Postgres, QueryBuilder};

use crate::filters::{Condition, ConditionRow, FieldKind, FilterField};

use super::params::FilterTab;

/// Search parameters for the traders table, resolved from explorer state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraderQuery {
    pub tab: FilterTab,
    /// Rows of the active tab; ignored on the labels tab.
    pub filters: Vec<ConditionRow>,
    pub labels: Vec<String>,
    pub if_labels: Vec<String>,
    pub page: u32,
    pub limit: u32,
}

impl TraderQuery {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// `SELECT` for one page, ordered by PnL.
    pub fn search_sql(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT * FROM ");
        self.push_source(&mut qb);
        self.push_conditions(&mut qb);
        qb.push(" ORDER BY pnl DESC, id LIMIT ");
        qb.push_bind(i64::from(self.limit));
        qb.push(" OFFSET ");
        qb.push_bind(self.offset());
        qb
    }

    /// `COUNT(*)` over the same conditions, without pagination.
    pub fn count_sql(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
        self.push_source(&mut qb);
        self.push_conditions(&mut qb);
        qb
    }

    fn is_ranked(&self) -> bool {
        self.tab == FilterTab::Ranking
    }

    fn push_source(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        if !self.is_ranked() {
            qb.push("traders");
            return;
        }

        // Percentile ranks are window functions, so they live in a subquery
        // the WHERE clause can reference.
        qb.push("(SELECT t.*");
        for field in FilterField::ALL.iter().filter(|f| f.is_rankable()) {
            qb.push(format!(
                ", PERCENT_RANK() OVER (ORDER BY t.{col}) * 100 AS {col}_rank",
                col = field.column()
            ));
        }
        qb.push(" FROM traders t) AS traders");
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" WHERE TRUE");

        if self.tab == FilterTab::Labels {
            if !self.labels.is_empty() {
                qb.push(" AND labels @> ");
                qb.push_bind(self.labels.clone());
            }
            if !self.if_labels.is_empty() {
                qb.push(" AND if_labels && ");
                qb.push_bind(self.if_labels.clone());
            }
            return;
        }

        let ranked = self.is_ranked();
        let applied = self
            .filters
            .iter()
            .filter(|row| push_row(qb, row, ranked))
            .count();
        tracing::trace!(applied, total = self.filters.len(), "Filter rows applied");
    }
}

/// Append one row's predicate. Returns false when the row is skipped.
fn push_row(qb: &mut QueryBuilder<'static, Postgres>, row: &ConditionRow, ranked: bool) -> bool {
    let Some(field) = FilterField::from_str(&row.key) else {
        tracing::warn!(key = %row.key, "Skipping filter on unknown field");
        return false;
    };

    match (field.kind(), &row.condition) {
        (FieldKind::TokenList, Condition::In(Some(values))) if !values.is_empty() => {
            qb.push(format!(" AND {} && ", field.column()));
            qb.push_bind(values.clone());
            true
        }
        (FieldKind::Numeric | FieldKind::Timestamp, Condition::Gte(_) | Condition::Lte(_) | Condition::Between { .. }) => {
            // NaN and infinities never reach SQL.
            let gte = row.gte_bound().filter(|v| v.is_finite());
            let lte = row.lte_bound().filter(|v| v.is_finite());
            if gte.is_none() && lte.is_none() {
                tracing::debug!(key = %row.key, "Skipping filter without usable bounds");
                return false;
            }

            let expr = column_expr(field, ranked);
            if let Some(v) = gte {
                qb.push(format!(" AND {expr} >= "));
                qb.push_bind(v);
            }
            if let Some(v) = lte {
                qb.push(format!(" AND {expr} <= "));
                qb.push_bind(v);
            }
            true
        }
        _ => {
            tracing::warn!(
                key = %row.key,
                condition = %row.condition_type(),
                "Skipping filter with unsupported condition for field"
            );
            false
        }
    }
}

fn column_expr(field: FilterField, ranked: bool) -> String {
    match field.kind() {
        FieldKind::Timestamp => format!("EXTRACT(EPOCH FROM {})::float8", field.column()),
        _ if ranked => format!("{}_rank", field.column()),
        _ => format!("{}::float8", field.column()),
    }
}
