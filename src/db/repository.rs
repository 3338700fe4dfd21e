use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Apod, FavoriteApod, MediaType};

use super::schema::SCHEMA;

const DATE_FMT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Cache operations

    pub async fn upsert_cached(&self, apod: Apod) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO apod_cache (date, title, explanation, url, hdurl, media_type, service_version, cached_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                       ON CONFLICT(date) DO UPDATE SET
                           title = excluded.title,
                           explanation = excluded.explanation,
                           url = excluded.url,
                           hdurl = excluded.hdurl,
                           media_type = excluded.media_type,
                           service_version = excluded.service_version,
                           cached_at = excluded.cached_at"#,
                    params![
                        apod.date.format(DATE_FMT).to_string(),
                        apod.title,
                        apod.explanation,
                        apod.url,
                        apod.hdurl,
                        apod.media_type.as_str(),
                        apod.service_version,
                        Utc::now().to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Window over the cache, most recently inserted first.
    pub async fn get_cached_page(&self, limit: usize, offset: usize) -> Result<Vec<Apod>> {
        let apods = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT date, title, explanation, url, hdurl, media_type, service_version
                     FROM apod_cache ORDER BY cached_at DESC LIMIT ?1 OFFSET ?2",
                )?;
                let apods = stmt
                    .query_map(params![limit as i64, offset as i64], |row| {
                        Ok(apod_from_row(row))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(apods)
            })
            .await?;
        Ok(apods)
    }

    pub async fn get_cached_by_date(&self, date: NaiveDate) -> Result<Option<Apod>> {
        let key = date.format(DATE_FMT).to_string();
        let apod = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT date, title, explanation, url, hdurl, media_type, service_version
                     FROM apod_cache WHERE date = ?1",
                )?;
                let apod = stmt
                    .query_row(params![key], |row| Ok(apod_from_row(row)))
                    .optional()?;
                Ok(apod)
            })
            .await?;
        Ok(apod)
    }

    pub async fn cached_count(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM apod_cache", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    /// Age-based sweep. Returns the number of rows removed.
    pub async fn delete_cached_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM apod_cache WHERE cached_at < ?1",
                    params![cutoff.to_rfc3339()],
                )?;
                Ok(deleted)
            })
            .await?;
        Ok(deleted)
    }

    pub async fn clear_cached(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute("DELETE FROM apod_cache", [])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Favorite operations

    pub async fn insert_favorite(&self, apod: Apod) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT OR REPLACE INTO favorites (date, title, explanation, url, hdurl, media_type, service_version, added_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                    params![
                        apod.date.format(DATE_FMT).to_string(),
                        apod.title,
                        apod.explanation,
                        apod.url,
                        apod.hdurl,
                        apod.media_type.as_str(),
                        apod.service_version,
                        Utc::now().to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn delete_favorite(&self, date: NaiveDate) -> Result<()> {
        let key = date.format(DATE_FMT).to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM favorites WHERE date = ?1", params![key])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn is_favorite(&self, date: NaiveDate) -> Result<bool> {
        let key = date.format(DATE_FMT).to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let exists: i64 = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM favorites WHERE date = ?1)",
                    params![key],
                    |row| row.get(0),
                )?;
                Ok(exists != 0)
            })
            .await?;
        Ok(exists)
    }

    pub async fn get_favorites(&self) -> Result<Vec<FavoriteApod>> {
        let favorites = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT date, title, explanation, url, hdurl, media_type, service_version, added_at
                     FROM favorites ORDER BY added_at DESC",
                )?;
                let favorites = stmt
                    .query_map([], |row| Ok(favorite_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(favorites)
            })
            .await?;
        Ok(favorites)
    }

    pub async fn favorites_count(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM favorites", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    pub async fn clear_favorites(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute("DELETE FROM favorites", [])?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn apod_from_row(row: &Row) -> Apod {
    Apod {
        date: row
            .get::<_, String>(0)
            .ok()
            .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok())
            .unwrap_or(NaiveDate::MIN),
        title: row.get(1).unwrap(),
        explanation: row.get(2).unwrap(),
        url: row.get(3).unwrap(),
        hdurl: row.get(4).unwrap(),
        media_type: MediaType::parse(&row.get::<_, String>(5).unwrap()),
        service_version: row.get(6).unwrap(),
    }
}

fn favorite_from_row(row: &Row) -> FavoriteApod {
    FavoriteApod {
        apod: apod_from_row(row),
        added_at: row
            .get::<_, String>(7)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(day: u32) -> Apod {
        Apod {
            date: NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
            title: format!("Picture {day}"),
            explanation: "A test record".to_string(),
            url: format!("https://apod.nasa.gov/image/2608/pic{day}.jpg"),
            hdurl: Some(format!("https://apod.nasa.gov/image/2608/pic{day}_hd.jpg")),
            media_type: MediaType::Image,
            service_version: "v1".to_string(),
        }
    }

    async fn open_repo(dir: &tempfile::TempDir) -> Repository {
        let path = dir.path().join("test.db");
        Repository::new(path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn upsert_stores_exactly_one_row_per_date() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let apod = sample(1);

        repo.upsert_cached(apod.clone()).await.unwrap();
        repo.upsert_cached(apod.clone()).await.unwrap();

        assert_eq!(repo.cached_count().await.unwrap(), 1);
        let stored = repo.get_cached_by_date(apod.date).await.unwrap().unwrap();
        assert_eq!(stored, apod);
    }

    #[tokio::test]
    async fn upsert_replaces_changed_content() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let mut apod = sample(2);

        repo.upsert_cached(apod.clone()).await.unwrap();
        apod.title = "Renamed".to_string();
        repo.upsert_cached(apod.clone()).await.unwrap();

        let stored = repo.get_cached_by_date(apod.date).await.unwrap().unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(repo.cached_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn page_window_respects_limit_and_offset() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;

        for day in 1..=6 {
            repo.upsert_cached(sample(day)).await.unwrap();
        }

        let first = repo.get_cached_page(4, 0).await.unwrap();
        let second = repo.get_cached_page(4, 4).await.unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 2);

        // Most recently inserted comes first, and windows do not overlap
        assert_eq!(first[0].date, NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());
        for apod in &second {
            assert!(!first.iter().any(|a| a.date == apod.date));
        }
    }

    #[tokio::test]
    async fn favorite_membership_round_trip() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let apod = sample(3);

        assert!(!repo.is_favorite(apod.date).await.unwrap());
        repo.insert_favorite(apod.clone()).await.unwrap();
        assert!(repo.is_favorite(apod.date).await.unwrap());
        repo.delete_favorite(apod.date).await.unwrap();
        assert!(!repo.is_favorite(apod.date).await.unwrap());
    }

    #[tokio::test]
    async fn favorites_survive_cache_clear() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let apod = sample(4);

        repo.upsert_cached(apod.clone()).await.unwrap();
        repo.insert_favorite(apod.clone()).await.unwrap();
        repo.clear_cached().await.unwrap();

        assert_eq!(repo.cached_count().await.unwrap(), 0);
        assert!(repo.is_favorite(apod.date).await.unwrap());
    }

    #[tokio::test]
    async fn delete_cached_before_sweeps_old_rows() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;

        repo.upsert_cached(sample(5)).await.unwrap();

        // Everything was just inserted, so a cutoff in the past removes nothing
        let past = Utc::now() - chrono::Duration::days(7);
        assert_eq!(repo.delete_cached_before(past).await.unwrap(), 0);

        // A future cutoff removes the lot
        let future = Utc::now() + chrono::Duration::days(1);
        assert_eq!(repo.delete_cached_before(future).await.unwrap(), 1);
        assert_eq!(repo.cached_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn favorites_are_ordered_most_recent_first() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;

        repo.insert_favorite(sample(1)).await.unwrap();
        repo.insert_favorite(sample(2)).await.unwrap();

        let favorites = repo.get_favorites().await.unwrap();
        assert_eq!(favorites.len(), 2);
        assert_eq!(
            favorites[0].apod.date,
            NaiveDate::from_ymd_opt(2026, 8, 2).unwrap()
        );
        assert!(favorites[0].added_at >= favorites[1].added_at);
    }
}
