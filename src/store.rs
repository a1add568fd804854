//! Per-bot SQLite store for user and guild settings and the track cache.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::audio::Track;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid stored setting: {0}")]
    Json(#[from] serde_json::Error),
}

/// A track we have already resolved once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoredTrack {
    pub id: String,
    pub title: String,
    pub duration: u64,
    pub plays: u64,
    pub query: Option<String>,
    pub youtube_url: Option<String>,
    pub spotify_url: Option<String>,
    pub thumbnail: Option<String>,
    pub requester: Option<String>,
}

pub struct Database {
    conn: Mutex<Connection>,
}

#[derive(Clone, Copy)]
enum Table {
    Users,
    Guilds,
}

impl Table {
    fn name(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Guilds => "guilds",
        }
    }
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                settings TEXT NOT NULL DEFAULT '{}'
            );
            CREATE TABLE IF NOT EXISTS guilds (
                id TEXT PRIMARY KEY,
                volume REAL,
                music_channel TEXT,
                settings TEXT NOT NULL DEFAULT '{}'
            );
            CREATE TABLE IF NOT EXISTS tracks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                duration INTEGER NOT NULL DEFAULT 0,
                plays INTEGER NOT NULL DEFAULT 0,
                query TEXT,
                youtube_url TEXT,
                spotify_url TEXT,
                thumbnail TEXT,
                requester TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_tracks_query ON tracks(query);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settings(&self, table: Table, id: u64) -> Result<Map<String, Value>, StoreError> {
        let sql = format!("SELECT settings FROM {} WHERE id = ?1", table.name());
        let raw: Option<String> = self
            .conn()
            .query_row(&sql, params![id.to_string()], |row| row.get(0))
            .optional()?;
        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Map::new()),
        }
    }

    fn set_setting<T: Serialize>(
        &self,
        table: Table,
        id: u64,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let mut settings = self.settings(table, id)?;
        settings.insert(key.to_string(), serde_json::to_value(value)?);
        let sql = format!(
            "INSERT INTO {} (id, settings) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET settings = excluded.settings",
            table.name()
        );
        self.conn().execute(
            &sql,
            params![id.to_string(), serde_json::to_string(&settings)?],
        )?;
        Ok(())
    }

    pub fn get_user_setting<T: DeserializeOwned>(
        &self,
        user_id: u64,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        self.settings(Table::Users, user_id)?
            .remove(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    pub fn set_user_setting<T: Serialize>(
        &self,
        user_id: u64,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        self.set_setting(Table::Users, user_id, key, value)
    }

    pub fn get_guild_setting<T: DeserializeOwned>(
        &self,
        guild_id: u64,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        self.settings(Table::Guilds, guild_id)?
            .remove(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    pub fn set_guild_setting<T: Serialize>(
        &self,
        guild_id: u64,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        self.set_setting(Table::Guilds, guild_id, key, value)
    }

    pub fn get_all_users(&self) -> Result<Vec<u64>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|id| id.parse().ok())
            .collect();
        Ok(ids)
    }

    /// Users with the highest integer value for `key`, best first.
    pub fn top_users(&self, key: &str, limit: usize) -> Result<Vec<(u64, i64)>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, CAST(json_extract(settings, '$.' || ?1) AS INTEGER) AS value
             FROM users
             WHERE json_extract(settings, '$.' || ?1) IS NOT NULL
             ORDER BY value DESC, id
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![key, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, value)| Some((id.parse().ok()?, value)))
            .collect();
        Ok(rows)
    }

    pub fn guild_volume(&self, guild_id: u64) -> Result<Option<f32>, StoreError> {
        let volume: Option<Option<f64>> = self
            .conn()
            .query_row(
                "SELECT volume FROM guilds WHERE id = ?1",
                params![guild_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(volume.flatten().map(|v| v as f32))
    }

    pub fn set_guild_volume(&self, guild_id: u64, volume: f32) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO guilds (id, volume) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET volume = excluded.volume",
            params![guild_id.to_string(), f64::from(volume)],
        )?;
        Ok(())
    }

    pub fn music_channel(&self, guild_id: u64) -> Result<Option<u64>, StoreError> {
        let channel: Option<Option<String>> = self
            .conn()
            .query_row(
                "SELECT music_channel FROM guilds WHERE id = ?1",
                params![guild_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(channel.flatten().and_then(|c| c.parse().ok()))
    }

    pub fn set_music_channel(&self, guild_id: u64, channel_id: u64) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO guilds (id, music_channel) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET music_channel = excluded.music_channel",
            params![guild_id.to_string(), channel_id.to_string()],
        )?;
        Ok(())
    }

    pub fn find_track(&self, id: &str) -> Result<Option<StoredTrack>, StoreError> {
        self.find_track_where("id", id)
    }

    /// Cached result of an earlier search, so repeated queries skip the API.
    pub fn find_track_by_query(&self, query: &str) -> Result<Option<StoredTrack>, StoreError> {
        self.find_track_where("query", query)
    }

    fn find_track_where(&self, column: &str, value: &str) -> Result<Option<StoredTrack>, StoreError> {
        let sql = format!(
            "SELECT id, title, duration, plays, query, youtube_url, spotify_url, thumbnail, requester
             FROM tracks WHERE {column} = ?1 LIMIT 1"
        );
        let track = self
            .conn()
            .query_row(&sql, params![value], |row| {
                Ok(StoredTrack {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    duration: row.get::<_, i64>(2)?.max(0) as u64,
                    plays: row.get::<_, i64>(3)?.max(0) as u64,
                    query: row.get(4)?,
                    youtube_url: row.get(5)?,
                    spotify_url: row.get(6)?,
                    thumbnail: row.get(7)?,
                    requester: row.get(8)?,
                })
            })
            .optional()?;
        Ok(track)
    }

    /// Inserts or refreshes a track, keeping its play count.
    pub fn save_track(&self, track: &StoredTrack) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO tracks
                (id, title, duration, plays, query, youtube_url, spotify_url, thumbnail, requester)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                duration = excluded.duration,
                query = COALESCE(excluded.query, tracks.query),
                youtube_url = COALESCE(excluded.youtube_url, tracks.youtube_url),
                spotify_url = COALESCE(excluded.spotify_url, tracks.spotify_url),
                thumbnail = COALESCE(excluded.thumbnail, tracks.thumbnail),
                requester = COALESCE(excluded.requester, tracks.requester)",
            params![
                track.id,
                track.title,
                track.duration as i64,
                track.plays as i64,
                track.query,
                track.youtube_url,
                track.spotify_url,
                track.thumbnail,
                track.requester,
            ],
        )?;
        Ok(())
    }

    /// Counts one play of `track`. Tracks without a key are not stored.
    pub fn record_play(&self, track: &Track) -> Result<(), StoreError> {
        let Some(key) = &track.key else {
            return Ok(());
        };
        self.conn().execute(
            "INSERT INTO tracks (id, title, duration, plays, youtube_url, thumbnail, requester)
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET plays = tracks.plays + 1",
            params![
                key,
                track.title,
                track.duration.unwrap_or(0) as i64,
                track.url,
                track.thumbnail,
                track.requester,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::TrackSource;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_missing_setting_is_none() {
        let db = db();
        assert_eq!(db.get_user_setting::<i64>(1, "gold").unwrap(), None);
    }

    #[test]
    fn test_user_settings_roundtrip_keeps_other_keys() {
        let db = db();
        db.set_user_setting(7, "gold", &3).unwrap();
        db.set_user_setting(7, "opendota_id", &"82279028").unwrap();
        db.set_user_setting(7, "gold", &4).unwrap();

        assert_eq!(db.get_user_setting::<i64>(7, "gold").unwrap(), Some(4));
        assert_eq!(
            db.get_user_setting::<String>(7, "opendota_id").unwrap().as_deref(),
            Some("82279028")
        );
    }

    #[test]
    fn test_guild_settings_are_separate_from_users() {
        let db = db();
        db.set_guild_setting(7, "prefix", &";").unwrap();
        assert_eq!(db.get_user_setting::<String>(7, "prefix").unwrap(), None);
        assert_eq!(
            db.get_guild_setting::<String>(7, "prefix").unwrap().as_deref(),
            Some(";")
        );
    }

    #[test]
    fn test_get_all_users() {
        let db = db();
        db.set_user_setting(2, "gold", &1).unwrap();
        db.set_user_setting(1, "gold", &1).unwrap();
        let mut users = db.get_all_users().unwrap();
        users.sort();
        assert_eq!(users, vec![1, 2]);
    }

    #[test]
    fn test_top_users() {
        let db = db();
        db.set_user_setting(1, "gold", &5).unwrap();
        db.set_user_setting(2, "gold", &12).unwrap();
        db.set_user_setting(3, "opendota_id", &"x").unwrap();
        db.set_user_setting(4, "gold", &7).unwrap();

        assert_eq!(db.top_users("gold", 2).unwrap(), vec![(2, 12), (4, 7)]);
        assert_eq!(db.top_users("gold", 10).unwrap().len(), 3);
    }

    #[test]
    fn test_guild_volume_and_channel() {
        let db = db();
        assert_eq!(db.guild_volume(5).unwrap(), None);
        db.set_guild_volume(5, 0.3).unwrap();
        db.set_music_channel(5, 99).unwrap();
        let volume = db.guild_volume(5).unwrap().unwrap();
        assert!((volume - 0.3).abs() < 1e-6);
        assert_eq!(db.music_channel(5).unwrap(), Some(99));
    }

    #[test]
    fn test_record_play_counts() {
        let db = db();
        let mut track = Track::new("Song", TrackSource::YouTube("https://youtu.be/abc".into()));
        track.key = Some("abc".into());
        track.duration = Some(200);

        db.record_play(&track).unwrap();
        db.record_play(&track).unwrap();

        let stored = db.find_track("abc").unwrap().unwrap();
        assert_eq!(stored.plays, 2);
        assert_eq!(stored.duration, 200);
    }

    #[test]
    fn test_record_play_without_key_is_ignored() {
        let db = db();
        let track = Track::new("tts", TrackSource::File("audio/tts/1.mp3".into()));
        db.record_play(&track).unwrap();
        assert!(db.find_track("").unwrap().is_none());
    }

    #[test]
    fn test_find_track_by_query() {
        let db = db();
        db.save_track(&StoredTrack {
            id: "dQw4w9WgXcQ".into(),
            title: "Never Gonna Give You Up".into(),
            duration: 212,
            query: Some("rick astley".into()),
            ..Default::default()
        })
        .unwrap();

        let found = db.find_track_by_query("rick astley").unwrap().unwrap();
        assert_eq!(found.id, "dQw4w9WgXcQ");
        assert!(db.find_track_by_query("something else").unwrap().is_none());
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database-test.sqlite");
        {
            let db = Database::open(&path).unwrap();
            db.set_user_setting(1, "gold", &9).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_user_setting::<i64>(1, "gold").unwrap(), Some(9));
    }
}
