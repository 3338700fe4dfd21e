use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::broadcast;

use crate::api::ApodRemote;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Apod, FavoriteApod};
use crate::net::Connectivity;

use super::loader::{Page, PageLoader};

/// Use-case surface over the paged loader, the local store, and the remote
/// client: list, detail, favorites, cache maintenance.
pub struct ApodStore<R, C> {
    loader: PageLoader<R, C>,
    repository: Repository,
    remote: Arc<R>,
    page_size: usize,
    cache_max_age_days: u32,
    cache_cleared: broadcast::Sender<()>,
}

impl<R, C> Clone for ApodStore<R, C> {
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
            repository: self.repository.clone(),
            remote: Arc::clone(&self.remote),
            page_size: self.page_size,
            cache_max_age_days: self.cache_max_age_days,
            cache_cleared: self.cache_cleared.clone(),
        }
    }
}

impl<R: ApodRemote, C: Connectivity> ApodStore<R, C> {
    pub fn new(
        remote: R,
        connectivity: C,
        repository: Repository,
        page_size: usize,
        cache_max_age_days: u32,
    ) -> Self {
        let remote = Arc::new(remote);
        let loader = PageLoader::new(
            Arc::clone(&remote),
            Arc::new(connectivity),
            repository.clone(),
        );
        let (cache_cleared, _) = broadcast::channel(4);

        Self {
            loader,
            repository,
            remote,
            page_size,
            cache_max_age_days,
            cache_cleared,
        }
    }

    pub async fn load_page(&self, page: usize) -> Result<Page> {
        self.loader.load_page(page, self.page_size).await
    }

    /// Point lookup for one date. Records are immutable once fetched, so a
    /// hit in the in-memory list or the cache is final; the remote is only
    /// consulted on a miss, with write-through.
    pub async fn detail(&self, date: NaiveDate) -> Result<Apod> {
        if let Some(apod) = self.loader.mem_lookup(date).await {
            return Ok(apod);
        }

        if let Some(apod) = self.repository.get_cached_by_date(date).await? {
            return Ok(apod);
        }

        match self.remote.fetch_by_date(date).await {
            Ok(apod) => {
                if let Err(e) = self.repository.upsert_cached(apod.clone()).await {
                    tracing::debug!("Cache write failed for {}: {e}", apod.date);
                }
                Ok(apod)
            }
            Err(AppError::Api { status: 404 }) => {
                Err(AppError::NotFound(date.format("%Y-%m-%d").to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Read membership, then insert or delete. Returns the new membership.
    /// Read-then-write without a transaction; single local user.
    pub async fn toggle_favorite(&self, apod: &Apod) -> Result<bool> {
        let was_favorite = self.repository.is_favorite(apod.date).await?;
        if was_favorite {
            self.repository.delete_favorite(apod.date).await?;
        } else {
            self.repository.insert_favorite(apod.clone()).await?;
        }
        Ok(!was_favorite)
    }

    pub async fn is_favorite(&self, date: NaiveDate) -> Result<bool> {
        self.repository.is_favorite(date).await
    }

    pub async fn favorites(&self) -> Result<Vec<FavoriteApod>> {
        self.repository.get_favorites().await
    }

    /// Delete all cache and favorite rows, reset the in-memory list, and
    /// tell every active screen to re-run its queries.
    pub async fn clear_cache(&self) -> Result<()> {
        self.loader.reset_mem().await;
        self.repository.clear_cached().await?;
        self.repository.clear_favorites().await?;

        // Nobody listening is fine
        let _ = self.cache_cleared.send(());
        tracing::info!("Cache and favorites cleared");
        Ok(())
    }

    pub fn subscribe_cache_cleared(&self) -> broadcast::Receiver<()> {
        self.cache_cleared.subscribe()
    }

    /// Age-based sweep of cache rows. Favorites are never swept.
    pub async fn sweep_old_cache(&self) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.cache_max_age_days));
        let removed = self.repository.delete_cached_before(cutoff).await?;
        if removed > 0 {
            tracing::info!("Swept {removed} cache rows older than {} days", self.cache_max_age_days);
        }
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<(i64, i64)> {
        let (cached, favorites) = futures::try_join!(
            self.repository.cached_count(),
            self.repository.favorites_count()
        )?;
        Ok((cached, favorites))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::data::loader::test_support::{apod, FailingRemote, FixedConnectivity, StaticRemote};

    use super::*;

    async fn repo(dir: &tempfile::TempDir) -> Repository {
        let path = dir.path().join("test.db");
        Repository::new(path.to_str().unwrap()).await.unwrap()
    }

    fn store<R: ApodRemote, C: Connectivity>(
        remote: R,
        connectivity: C,
        repository: Repository,
    ) -> ApodStore<R, C> {
        ApodStore::new(remote, connectivity, repository, 4, 7)
    }

    #[tokio::test]
    async fn toggling_twice_restores_membership() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let store = store(
            StaticRemote { items: vec![] },
            FixedConnectivity { online: false },
            repository,
        );
        let record = apod(1);

        assert!(!store.is_favorite(record.date).await.unwrap());
        assert!(store.toggle_favorite(&record).await.unwrap());
        assert!(store.is_favorite(record.date).await.unwrap());
        assert!(!store.toggle_favorite(&record).await.unwrap());
        assert!(!store.is_favorite(record.date).await.unwrap());
    }

    #[tokio::test]
    async fn clear_cache_empties_everything_and_notifies() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let store = store(
            StaticRemote {
                items: vec![apod(1), apod(2)],
            },
            FixedConnectivity { online: true },
            repository.clone(),
        );

        store.load_page(0).await.unwrap();
        store.toggle_favorite(&apod(1)).await.unwrap();
        let mut events = store.subscribe_cache_cleared();

        store.clear_cache().await.unwrap();

        let (cached, favorites) = store.stats().await.unwrap();
        assert_eq!(cached, 0);
        assert_eq!(favorites, 0);
        assert_eq!(store.loader.mem_len().await, 0);
        assert!(events.try_recv().is_ok());
    }

    #[tokio::test]
    async fn detail_prefers_cache_over_remote() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let record = apod(3);
        repository.upsert_cached(record.clone()).await.unwrap();

        // The remote would fail, so a success proves the cache was used
        let store = store(
            FailingRemote { status: 500 },
            FixedConnectivity { online: true },
            repository,
        );

        let found = store.detail(record.date).await.unwrap();
        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn detail_fetches_and_caches_on_miss() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let record = apod(4);
        let store = store(
            StaticRemote {
                items: vec![record.clone()],
            },
            FixedConnectivity { online: true },
            repository.clone(),
        );

        let found = store.detail(record.date).await.unwrap();
        assert_eq!(found, record);

        let cached = repository
            .get_cached_by_date(record.date)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cached, record);
    }

    #[tokio::test]
    async fn detail_maps_remote_404_to_not_found() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let store = store(
            FailingRemote { status: 404 },
            FixedConnectivity { online: true },
            repository,
        );

        let err = store
            .detail(apod(5).date)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn stats_reports_both_counters() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        repository.upsert_cached(apod(1)).await.unwrap();
        repository.upsert_cached(apod(2)).await.unwrap();
        repository.insert_favorite(apod(1)).await.unwrap();

        let store = store(
            StaticRemote { items: vec![] },
            FixedConnectivity { online: false },
            repository,
        );

        let (cached, favorites) = store.stats().await.unwrap();
        assert_eq!(cached, 2);
        assert_eq!(favorites, 1);
    }
}
