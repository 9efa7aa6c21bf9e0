//! Demo provider rows for fresh databases.

use mc_types::{NewProvider, ProviderStore, ProviderStoreError};

/// Status labels are free-form; the demo rows use the marketplace's own
/// labels ("정상" healthy, "과부하" overloaded).
pub fn demo_providers() -> Vec<NewProvider> {
    [
        ("node-1", 80.5, 6.4, "정상", "10.0.0.1"),
        ("node-2", 65.0, 3.2, "과부하", "10.0.0.2"),
        ("node-3", 92.0, 7.9, "정상", "10.0.0.3"),
    ]
    .into_iter()
    .map(|(name, cpu_free, ram_free, status, ip)| NewProvider {
        name: name.to_string(),
        cpu_free,
        ram_free,
        status: status.to_string(),
        ip_address: Some(ip.to_string()),
    })
    .collect()
}

/// Insert the demo providers unless the registry already has rows.
/// Returns the number of rows inserted.
pub async fn seed_if_empty(store: &dyn ProviderStore) -> Result<usize, ProviderStoreError> {
    if !store.list_providers().await?.is_empty() {
        tracing::info!("provider registry already populated, skipping seed");
        return Ok(0);
    }
    let rows = demo_providers();
    let n = rows.len();
    for row in rows {
        store.insert_provider(row).await?;
    }
    tracing::info!(count = n, "seeded demo providers");
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryProviderStore;

    #[tokio::test]
    async fn seeds_once() {
        let store = InMemoryProviderStore::new();
        assert_eq!(seed_if_empty(&store).await.unwrap(), 3);
        assert_eq!(seed_if_empty(&store).await.unwrap(), 0);
        let rows: Vec<(String, String)> = store
            .list_providers()
            .await
            .unwrap()
            .into_iter()
            .map(|p| (p.name, p.status))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("node-1".to_string(), "정상".to_string()),
                ("node-2".to_string(), "과부하".to_string()),
                ("node-3".to_string(), "정상".to_string()),
            ]
        );
    }
}
