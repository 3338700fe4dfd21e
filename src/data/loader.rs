use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::api::ApodRemote;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::Apod;
use crate::net::Connectivity;

/// How long the in-memory list from the last load stays usable.
const MEM_CACHE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// One loaded page window, with a fabricated cursor: the upstream listing
/// endpoint has no real pagination, so prev/next are just page numbers and
/// `next` ends when a short batch comes back.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Apod>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

impl Page {
    fn windowed(items: Vec<Apod>, page: usize, page_size: usize) -> Self {
        let next = if items.len() < page_size {
            None
        } else {
            Some(page + 1)
        };
        Self {
            items,
            prev: page.checked_sub(1),
            next,
        }
    }
}

#[derive(Default)]
struct MemCache {
    items: Vec<Apod>,
    loaded_at: Option<Instant>,
}

impl MemCache {
    fn is_fresh(&self) -> bool {
        self.loaded_at
            .is_some_and(|at| at.elapsed() < MEM_CACHE_TIMEOUT)
    }
}

/// Loads one page window at a time with an offline-first fallback chain:
/// remote with cache write-through when a usable network is detected,
/// cache when the remote fails or the network is down, and a failure only
/// when both are empty-handed.
pub struct PageLoader<R, C> {
    remote: Arc<R>,
    connectivity: Arc<C>,
    repository: Repository,
    mem: Arc<Mutex<MemCache>>,
}

impl<R, C> Clone for PageLoader<R, C> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            connectivity: Arc::clone(&self.connectivity),
            repository: self.repository.clone(),
            mem: Arc::clone(&self.mem),
        }
    }
}

impl<R: ApodRemote, C: Connectivity> PageLoader<R, C> {
    pub fn new(remote: Arc<R>, connectivity: Arc<C>, repository: Repository) -> Self {
        Self {
            remote,
            connectivity,
            repository,
            mem: Arc::new(Mutex::new(MemCache::default())),
        }
    }

    pub async fn load_page(&self, page: usize, page_size: usize) -> Result<Page> {
        let offset = page * page_size;

        // Read the cache window up front; it doubles as the fallback for
        // every failure branch below.
        let cached = self.repository.get_cached_page(page_size, offset).await?;
        tracing::debug!(
            "Loading page {page} (size {page_size}), {} cached rows in window",
            cached.len()
        );

        if !self.connectivity.is_online().await {
            if cached.is_empty() {
                return Err(AppError::NoData);
            }
            tracing::debug!("Offline, serving page {page} from cache");
            return Ok(Page::windowed(cached, page, page_size));
        }

        match self.remote.fetch_batch(page_size).await {
            Ok(items) => {
                for apod in &items {
                    if let Err(e) = self.repository.upsert_cached(apod.clone()).await {
                        tracing::debug!("Cache write failed for {}: {e}", apod.date);
                    }
                }
                self.update_mem(&items, page == 0).await;
                Ok(Page::windowed(items, page, page_size))
            }
            Err(e) => {
                if cached.is_empty() {
                    Err(e)
                } else {
                    tracing::debug!("Remote load failed ({e}), serving page {page} from cache");
                    Ok(Page::windowed(cached, page, page_size))
                }
            }
        }
    }

    /// Point lookup in the time-boxed in-memory list from the last load.
    pub async fn mem_lookup(&self, date: NaiveDate) -> Option<Apod> {
        let mem = self.mem.lock().await;
        if !mem.is_fresh() {
            return None;
        }
        mem.items.iter().find(|a| a.date == date).cloned()
    }

    pub async fn mem_len(&self) -> usize {
        self.mem.lock().await.items.len()
    }

    /// Drop the in-memory list, e.g. after the cache is cleared.
    pub async fn reset_mem(&self) {
        let mut mem = self.mem.lock().await;
        mem.items.clear();
        mem.loaded_at = None;
    }

    async fn update_mem(&self, items: &[Apod], first_page: bool) {
        let mut mem = self.mem.lock().await;
        if first_page {
            mem.items.clear();
        }
        mem.items.extend_from_slice(items);
        mem.loaded_at = Some(Instant::now());
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::api::ApodRemote;
    use crate::error::{AppError, Result};
    use crate::models::{Apod, MediaType};
    use crate::net::Connectivity;

    pub fn apod(day: u32) -> Apod {
        Apod {
            date: NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
            title: format!("Picture {day}"),
            explanation: "From the archive".to_string(),
            url: format!("https://apod.nasa.gov/image/2608/pic{day}.jpg"),
            hdurl: None,
            media_type: MediaType::Image,
            service_version: "v1".to_string(),
        }
    }

    /// Remote that serves a fixed set of records.
    pub struct StaticRemote {
        pub items: Vec<Apod>,
    }

    #[async_trait]
    impl ApodRemote for StaticRemote {
        async fn fetch_by_date(&self, date: NaiveDate) -> Result<Apod> {
            self.items
                .iter()
                .find(|a| a.date == date)
                .cloned()
                .ok_or(AppError::Api { status: 404 })
        }

        async fn fetch_batch(&self, count: usize) -> Result<Vec<Apod>> {
            Ok(self.items.iter().take(count).cloned().collect())
        }
    }

    /// Remote that always fails with the given HTTP status.
    pub struct FailingRemote {
        pub status: u16,
    }

    #[async_trait]
    impl ApodRemote for FailingRemote {
        async fn fetch_by_date(&self, _date: NaiveDate) -> Result<Apod> {
            Err(AppError::Api {
                status: self.status,
            })
        }

        async fn fetch_batch(&self, _count: usize) -> Result<Vec<Apod>> {
            Err(AppError::Api {
                status: self.status,
            })
        }
    }

    pub struct FixedConnectivity {
        pub online: bool,
    }

    #[async_trait]
    impl Connectivity for FixedConnectivity {
        async fn is_online(&self) -> bool {
            self.online
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::tempdir;

    use super::test_support::{apod, FailingRemote, FixedConnectivity, StaticRemote};
    use super::*;

    async fn repo(dir: &tempfile::TempDir) -> Repository {
        let path = dir.path().join("test.db");
        Repository::new(path.to_str().unwrap()).await.unwrap()
    }

    fn loader<R: ApodRemote, C: Connectivity>(
        remote: R,
        connectivity: C,
        repository: Repository,
    ) -> PageLoader<R, C> {
        PageLoader::new(Arc::new(remote), Arc::new(connectivity), repository)
    }

    #[tokio::test]
    async fn online_fetch_writes_through_to_cache() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let fetched = vec![apod(1), apod(2)];
        let loader = loader(
            StaticRemote {
                items: fetched.clone(),
            },
            FixedConnectivity { online: true },
            repository.clone(),
        );

        let page = loader.load_page(0, 4).await.unwrap();
        assert_eq!(page.items, fetched);
        assert_eq!(page.prev, None);
        // Short batch means the feed is exhausted
        assert_eq!(page.next, None);

        assert_eq!(repository.cached_count().await.unwrap(), 2);
        let stored = repository
            .get_cached_by_date(fetched[0].date)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, fetched[0]);
    }

    #[tokio::test]
    async fn full_batch_fabricates_next_cursor() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let loader = loader(
            StaticRemote {
                items: vec![apod(1), apod(2), apod(3), apod(4)],
            },
            FixedConnectivity { online: true },
            repository,
        );

        let page = loader.load_page(0, 4).await.unwrap();
        assert_eq!(page.next, Some(1));

        let page = loader.load_page(1, 4).await.unwrap();
        assert_eq!(page.prev, Some(0));
    }

    #[tokio::test]
    async fn remote_error_falls_back_to_cache() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        for day in 1..=3 {
            repository.upsert_cached(apod(day)).await.unwrap();
        }

        let loader = loader(
            FailingRemote { status: 500 },
            FixedConnectivity { online: true },
            repository,
        );

        let page = loader.load_page(0, 4).await.unwrap();
        assert_eq!(page.items.len(), 3);
    }

    #[tokio::test]
    async fn remote_error_with_empty_cache_surfaces_error() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let loader = loader(
            FailingRemote { status: 404 },
            FixedConnectivity { online: true },
            repository,
        );

        let err = loader.load_page(0, 4).await.unwrap_err();
        assert!(matches!(err, AppError::Api { status: 404 }));
    }

    #[tokio::test]
    async fn offline_serves_cache_without_failure() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        for day in 1..=2 {
            repository.upsert_cached(apod(day)).await.unwrap();
        }

        let loader = loader(
            FailingRemote { status: 500 },
            FixedConnectivity { online: false },
            repository,
        );

        let page = loader.load_page(0, 4).await.unwrap();
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn offline_with_empty_cache_is_no_data() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let loader = loader(
            StaticRemote { items: vec![] },
            FixedConnectivity { online: false },
            repository,
        );

        let err = loader.load_page(0, 4).await.unwrap_err();
        assert!(matches!(err, AppError::NoData));
    }

    #[tokio::test]
    async fn mem_list_serves_lookups_and_resets() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let loader = loader(
            StaticRemote {
                items: vec![apod(1)],
            },
            FixedConnectivity { online: true },
            repository,
        );

        loader.load_page(0, 4).await.unwrap();
        assert!(loader.mem_lookup(apod(1).date).await.is_some());

        loader.reset_mem().await;
        assert_eq!(loader.mem_len().await, 0);
        assert!(loader.mem_lookup(apod(1).date).await.is_none());
    }

    #[tokio::test]
    async fn first_page_replaces_mem_list_later_pages_append() {
        let dir = tempdir().unwrap();
        let repository = repo(&dir).await;
        let loader = loader(
            StaticRemote {
                items: vec![apod(1), apod(2), apod(3), apod(4)],
            },
            FixedConnectivity { online: true },
            repository,
        );

        loader.load_page(0, 4).await.unwrap();
        assert_eq!(loader.mem_len().await, 4);

        loader.load_page(1, 4).await.unwrap();
        assert_eq!(loader.mem_len().await, 8);

        loader.load_page(0, 4).await.unwrap();
        assert_eq!(loader.mem_len().await, 4);
    }
}
