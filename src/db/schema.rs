pub const SCHEMA: &str = r#"
-- apod_cache table
CREATE TABLE IF NOT EXISTS apod_cache (
    date TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    explanation TEXT NOT NULL,
    url TEXT NOT NULL,
    hdurl TEXT,
    media_type TEXT NOT NULL,
    service_version TEXT NOT NULL,
    cached_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_apod_cache_cached_at ON apod_cache(cached_at DESC);

-- favorites table
-- Rows are copies, not references: a favorite must survive cache eviction.
CREATE TABLE IF NOT EXISTS favorites (
    date TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    explanation TEXT NOT NULL,
    url TEXT NOT NULL,
    hdurl TEXT,
    media_type TEXT NOT NULL,
    service_version TEXT NOT NULL,
    added_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_favorites_added_at ON favorites(added_at DESC);
"#;
