use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::employee::Employee;

/// login -> employee record, so the directory can skip the users join
/// on hot paths. Logins are cached lowercased.
pub static EMPLOYEE_CACHE: Lazy<Cache<String, Employee>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

pub async fn store(login: &str, employee: Employee) {
    EMPLOYEE_CACHE.insert(login.to_lowercase(), employee).await;
}

pub async fn lookup(login: &str) -> Option<Employee> {
    EMPLOYEE_CACHE.get(&login.to_lowercase()).await
}

/// Batch insert resolved logins
async fn batch_store(entries: Vec<(String, Employee)>) {
    let futures: Vec<_> = entries
        .into_iter()
        .map(|(login, employee)| EMPLOYEE_CACHE.insert(login.to_lowercase(), employee))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load employees of RECENTLY active users into the cache (batched)
pub async fn warmup_employee_cache(
    pool: &MySqlPool,
    days: u32,
    batch_size: usize,
) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, u64, String, String, String)>(
        r#"
        SELECT u.login, e.id, e.first_name, e.last_name, e.email
        FROM users u
        INNER JOIN employees e ON e.id = u.employee_id
        WHERE u.last_login_at >= NOW() - INTERVAL ? DAY
        ORDER BY u.last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (login, id, first_name, last_name, email) = row?;
        batch.push((
            login,
            Employee {
                id,
                first_name,
                last_name,
                email,
            },
        ));
        total_count += 1;

        if batch.len() >= batch_size {
            batch_store(std::mem::take(&mut batch)).await;
        }
    }

    // Insert any remaining entries
    if !batch.is_empty() {
        batch_store(batch).await;
    }

    log::info!(
        "Employee cache warmup complete: {} recent users (last {} days)",
        total_count,
        days
    );

    Ok(())
}
