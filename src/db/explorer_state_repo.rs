use sqlx::PgPool;

/// Fetch the stored JSON payload of one explorer state slot.
pub async fn get_payload(pool: &PgPool, client_id: &str, slot: &str) -> anyhow::Result<Option<String>> {
    let row = sqlx::query_as::<_, (String,)>(
        "SELECT payload FROM explorer_state WHERE client_id = $1 AND slot = $2",
    )
    .bind(client_id)
    .bind(slot)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.0))
}

/// Insert or replace the payload of one explorer state slot.
pub async fn upsert_payload(
    pool: &PgPool,
    client_id: &str,
    slot: &str,
    payload: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO explorer_state (client_id, slot, payload, updated_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (client_id, slot) DO UPDATE SET payload = $3, updated_at = NOW()
        "#,
    )
    .bind(client_id)
    .bind(slot)
    .bind(payload)
    .execute(pool)
    .await?;

    Ok(())
}
