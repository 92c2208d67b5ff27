use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use tokio::sync::watch;

use crate::app::{NewsflowError, Result};
use crate::domain::{Source, SourceBase, SourceSelection, Story, StoryBase, StoryExtra, SyncRecord};
use crate::store::Store;

const SOURCE_QUERY: &str = "SELECT b.id, b.name, b.url, s.selected \
     FROM source_bases AS b \
     INNER JOIN source_selections AS s ON b.id = s.id";

const STORY_QUERY: &str = "SELECT b.url, b.title, b.description, b.author, b.thumbnail, b.published_at, \
         s.id, s.name, s.url, s.selected, \
         e.read, e.content, e.word_count \
     FROM story_bases AS b \
     INNER JOIN story_extras AS e ON b.url = e.url \
     INNER JOIN (SELECT sb.id AS id, sb.name AS name, sb.url AS url, ss.selected AS selected \
                 FROM source_bases AS sb \
                 INNER JOIN source_selections AS ss ON sb.id = ss.id \
                 WHERE ss.selected = 1) AS s ON b.source = s.id";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    source_rev: watch::Sender<u64>,
    story_rev: watch::Sender<u64>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let (source_rev, _) = watch::channel(0);
        let (story_rev, _) = watch::channel(0);
        let store = Self {
            conn: Mutex::new(conn),
            source_rev,
            story_rev,
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| NewsflowError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            NewsflowError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn bump_sources(&self) {
        self.source_rev.send_modify(|rev| *rev += 1);
    }

    fn bump_stories(&self) {
        self.story_rev.send_modify(|rev| *rev += 1);
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn source_from_row(row: &Row<'_>) -> rusqlite::Result<Source> {
        Ok(Source {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            selected: row.get::<_, i32>(3)? != 0,
        })
    }

    fn story_from_row(row: &Row<'_>) -> rusqlite::Result<Story> {
        Ok(Story {
            url: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            author: row.get(3)?,
            thumbnail: row.get(4)?,
            published_at: row
                .get::<_, Option<String>>(5)?
                .and_then(|s| Self::parse_datetime(&s)),
            source: Source {
                id: row.get(6)?,
                name: row.get(7)?,
                url: row.get(8)?,
                selected: row.get::<_, i32>(9)? != 0,
            },
            read: row.get::<_, i32>(10)? != 0,
            content: row.get(11)?,
            word_count: row.get(12)?,
        })
    }
}

impl Store for SqliteStore {
    fn all_sources(&self) -> Result<Vec<Source>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SOURCE_QUERY} ORDER BY b.name, b.id"))?;
        let sources = stmt
            .query_map([], Self::source_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    fn selected_sources(&self) -> Result<Vec<Source>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{SOURCE_QUERY} WHERE s.selected = 1 ORDER BY b.name, b.id"
        ))?;
        let sources = stmt
            .query_map([], Self::source_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    fn save_source_bases(&self, sources: &[SourceBase]) -> Result<()> {
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            for source in sources {
                tx.execute(
                    "INSERT OR REPLACE INTO source_bases (id, name, url) VALUES (?1, ?2, ?3)",
                    params![source.id, source.name, source.url],
                )?;
            }
            tx.commit()?;
        }
        self.bump_sources();
        self.bump_stories();
        Ok(())
    }

    fn save_source_selections(&self, selections: &[SourceSelection]) -> Result<()> {
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            for selection in selections {
                tx.execute(
                    "INSERT OR IGNORE INTO source_selections (id, selected) VALUES (?1, ?2)",
                    params![selection.id, selection.selected as i32],
                )?;
            }
            tx.commit()?;
        }
        self.bump_sources();
        self.bump_stories();
        Ok(())
    }

    fn update_source_selection(&self, selection: &SourceSelection) -> Result<()> {
        self.conn()?.execute(
            "UPDATE source_selections SET selected = ?1 WHERE id = ?2",
            params![selection.selected as i32, selection.id],
        )?;
        // A selection toggle changes both the source list and the
        // selected-sources story join.
        self.bump_sources();
        self.bump_stories();
        Ok(())
    }

    fn all_stories(&self) -> Result<Vec<Story>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{STORY_QUERY} ORDER BY b.published_at DESC"))?;
        let stories = stmt
            .query_map([], Self::story_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stories)
    }

    fn story(&self, url: &str) -> Result<Vec<Story>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{STORY_QUERY} WHERE b.url = ?1"))?;
        let stories = stmt
            .query_map(params![url], Self::story_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stories)
    }

    fn save_story_bases(&self, stories: &[StoryBase]) -> Result<()> {
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            for story in stories {
                tx.execute(
                    "INSERT OR REPLACE INTO story_bases \
                     (url, title, description, source, author, thumbnail, published_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        story.url,
                        story.title,
                        story.description,
                        story.source,
                        story.author,
                        story.thumbnail,
                        story.published_at.map(|dt| dt.to_rfc3339()),
                    ],
                )?;
            }
            tx.commit()?;
        }
        self.bump_stories();
        Ok(())
    }

    fn save_story_extras(&self, extras: &[StoryExtra]) -> Result<()> {
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            for extra in extras {
                tx.execute(
                    "INSERT OR IGNORE INTO story_extras (url, read, content, word_count) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![extra.url, extra.read as i32, extra.content, extra.word_count],
                )?;
            }
            tx.commit()?;
        }
        self.bump_stories();
        Ok(())
    }

    fn story_extra(&self, url: &str) -> Result<Option<StoryExtra>> {
        let conn = self.conn()?;
        let extra = conn
            .query_row(
                "SELECT url, read, content, word_count FROM story_extras WHERE url = ?1",
                params![url],
                |row| {
                    Ok(StoryExtra {
                        url: row.get(0)?,
                        read: row.get::<_, i32>(1)? != 0,
                        content: row.get(2)?,
                        word_count: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(extra)
    }

    fn update_story_extra(&self, extra: &StoryExtra) -> Result<()> {
        self.conn()?.execute(
            "UPDATE story_extras SET read = ?1, content = ?2, word_count = ?3 WHERE url = ?4",
            params![extra.read as i32, extra.content, extra.word_count, extra.url],
        )?;
        self.bump_stories();
        Ok(())
    }

    fn sync_record(&self, resource: &str) -> Result<Option<SyncRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT resource, timestamp FROM syncs WHERE resource = ?1",
                params![resource],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                    ))
                },
            )
            .optional()?;

        Ok(record.and_then(|(resource, timestamp)| {
            Self::parse_datetime(&timestamp).map(|ts| SyncRecord::new(resource, ts))
        }))
    }

    fn save_sync_record(&self, record: &SyncRecord) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO syncs (resource, timestamp) VALUES (?1, ?2)",
            params![record.resource, record.timestamp.to_rfc3339()],
        )?;
        Ok(())
    }

    fn source_changes(&self) -> watch::Receiver<u64> {
        self.source_rev.subscribe()
    }

    fn story_changes(&self) -> watch::Receiver<u64> {
        self.story_rev.subscribe()
    }
}
