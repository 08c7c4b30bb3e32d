use sqlx::PgPool;

pub const MAX_MATCHING_ACCOUNTS: i64 = 50;

/// Escape `LIKE` metacharacters so the prefix matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Account names are stored lowercase.
pub fn normalize_prefix(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Up to fifty account names starting with `prefix`, shortest first and alphabetical within
/// a length. The fifty are the alphabetically first matches.
pub async fn find_matching_accounts(
    pool: &PgPool,
    hive_schema: &str,
    prefix: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let pattern = format!("{}%", escape_like(&normalize_prefix(prefix)));
    let sql = format!(
        r#"
        SELECT m.name
        FROM (
          SELECT av.name::TEXT AS name
          FROM {hive}.accounts_view av
          WHERE av.name LIKE $1 ESCAPE '\'
          ORDER BY av.name
          LIMIT $2
        ) m
        ORDER BY LENGTH(m.name), m.name
        "#,
        hive = hive_schema,
    );
    let names: Vec<(String,)> = sqlx::query_as(&sql)
        .bind(pattern)
        .bind(MAX_MATCHING_ACCOUNTS)
        .fetch_all(pool)
        .await?;
    Ok(names.into_iter().map(|(name,)| name).collect())
}
