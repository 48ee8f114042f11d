/*!
 * SQLite-backed dictionary and known-word stores.
 *
 * Both stores wrap one rusqlite connection behind a mutex and run their
 * synchronous SQL on tokio's blocking pool. The schema bootstraps on open,
 * so a fresh database file is usable immediately.
 */

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use rusqlite::{Connection, params};

use crate::adapters::{DictionaryStore, UserProgressStore};
use crate::errors::DependencyError;
use crate::vocabulary::{CefrLevel, VocabularyRecord};

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "lexisub.db";

/// Default database directory name under the user's data directory
const DEFAULT_DB_DIRNAME: &str = "lexisub";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS vocabulary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    word TEXT NOT NULL,
    lemma TEXT NOT NULL,
    language TEXT NOT NULL,
    level TEXT NOT NULL,
    part_of_speech TEXT,
    gender TEXT,
    translations TEXT NOT NULL DEFAULT '[]',
    frequency_rank INTEGER,
    UNIQUE(lemma, language)
);
CREATE INDEX IF NOT EXISTS idx_vocabulary_lookup ON vocabulary(lemma, language);
CREATE INDEX IF NOT EXISTS idx_vocabulary_level ON vocabulary(language, level);

CREATE TABLE IF NOT EXISTS known_words (
    user_id TEXT NOT NULL,
    language TEXT NOT NULL,
    lemma TEXT NOT NULL,
    PRIMARY KEY (user_id, language, lemma)
);
";

/// Shared rusqlite connection with schema bootstrap
#[derive(Clone)]
pub struct SqliteConnection {
    db_path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl SqliteConnection {
    /// Open (and bootstrap) a database file
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening vocabulary database at: {:?}", db_path);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;
        conn.execute_batch(SCHEMA).context("Failed to initialize schema")?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database at the default per-user location
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_database_path()?)
    }

    /// In-memory database for tests
    pub fn open_in_memory() -> Result<Self> {
        debug!("Creating in-memory vocabulary database");
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        conn.execute_batch(SCHEMA).context("Failed to initialize schema")?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Default database path under the user's data directory
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// The database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_connection<F, T>(&self, f: F) -> Result<T, DependencyError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);

        tokio::task::spawn_blocking(move || {
            let conn = connection
                .lock()
                .map_err(|e| DependencyError::Store(format!("Database lock poisoned: {}", e)))?;
            f(&conn).map_err(|e| DependencyError::Store(e.to_string()))
        })
        .await
        .map_err(|e| DependencyError::Store(format!("Database task panicked: {}", e)))?
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("db_path", &self.db_path)
            .finish()
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<VocabularyRecord> {
    let level_text: String = row.get("level")?;
    let translations_json: String = row.get("translations")?;

    Ok(VocabularyRecord {
        id: row.get("id")?,
        word: row.get("word")?,
        lemma: row.get("lemma")?,
        language: row.get("language")?,
        level: CefrLevel::from_str(&level_text).unwrap_or(CefrLevel::Unknown),
        part_of_speech: row.get("part_of_speech")?,
        gender: row.get("gender")?,
        translations: serde_json::from_str(&translations_json).unwrap_or_default(),
        frequency_rank: row.get("frequency_rank")?,
    })
}

/// Dictionary store over the shared connection
#[derive(Debug, Clone)]
pub struct SqliteDictionaryStore {
    connection: SqliteConnection,
}

impl SqliteDictionaryStore {
    /// Create a store over an open connection
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }

    /// Insert or replace a dictionary record, returning its row id
    pub async fn upsert_word(&self, record: VocabularyRecord) -> Result<i64, DependencyError> {
        self.connection
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT INTO vocabulary
                         (word, lemma, language, level, part_of_speech, gender, translations, frequency_rank)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(lemma, language) DO UPDATE SET
                         word = excluded.word,
                         level = excluded.level,
                         part_of_speech = excluded.part_of_speech,
                         gender = excluded.gender,
                         translations = excluded.translations,
                         frequency_rank = excluded.frequency_rank",
                    params![
                        record.word.to_lowercase(),
                        record.lemma.to_lowercase(),
                        record.language.to_lowercase(),
                        record.level.as_str(),
                        record.part_of_speech,
                        record.gender,
                        serde_json::to_string(&record.translations).unwrap_or_else(|_| "[]".to_string()),
                        record.frequency_rank,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }
}

#[async_trait]
impl DictionaryStore for SqliteDictionaryStore {
    async fn get_word(
        &self,
        word: &str,
        language: &str,
    ) -> Result<Option<VocabularyRecord>, DependencyError> {
        let word = word.to_lowercase();
        let language = language.to_lowercase();

        self.connection
            .with_connection(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, word, lemma, language, level, part_of_speech, gender,
                            translations, frequency_rank
                     FROM vocabulary
                     WHERE (lemma = ?1 OR word = ?1) AND language = ?2
                     LIMIT 1",
                )?;
                let mut rows = stmt.query(params![word, language])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row_to_record(row)?)),
                    None => Ok(None),
                }
            })
            .await
    }

    async fn get_words_by_level(
        &self,
        language: &str,
        level: CefrLevel,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<VocabularyRecord>, DependencyError> {
        let language = language.to_lowercase();
        let level_text = level.as_str().to_string();

        self.connection
            .with_connection(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, word, lemma, language, level, part_of_speech, gender,
                            translations, frequency_rank
                     FROM vocabulary
                     WHERE language = ?1 AND level = ?2
                     ORDER BY frequency_rank IS NULL, frequency_rank, lemma
                     LIMIT ?3 OFFSET ?4",
                )?;
                let rows = stmt.query_map(
                    params![language, level_text, limit as i64, offset as i64],
                    row_to_record,
                )?;
                rows.collect()
            })
            .await
    }
}

/// Known-word store over the shared connection
#[derive(Debug, Clone)]
pub struct SqliteProgressStore {
    connection: SqliteConnection,
}

impl SqliteProgressStore {
    /// Create a store over an open connection
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }

    /// Mark lemmas as known for a user
    pub async fn add_known(
        &self,
        user_id: &str,
        language: &str,
        lemmas: Vec<String>,
    ) -> Result<(), DependencyError> {
        let user_id = user_id.to_string();
        let language = language.to_lowercase();

        self.connection
            .with_connection(move |conn| {
                let mut stmt = conn.prepare(
                    "INSERT OR IGNORE INTO known_words (user_id, language, lemma)
                     VALUES (?1, ?2, ?3)",
                )?;
                for lemma in lemmas {
                    stmt.execute(params![user_id, language, lemma.to_lowercase()])?;
                }
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl UserProgressStore for SqliteProgressStore {
    async fn known_lemmas(
        &self,
        user_id: &str,
        language: &str,
    ) -> Result<HashSet<String>, DependencyError> {
        let user_id = user_id.to_string();
        let language = language.to_lowercase();

        self.connection
            .with_connection(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT lemma FROM known_words WHERE user_id = ?1 AND language = ?2",
                )?;
                let rows = stmt.query_map(params![user_id, language], |row| row.get::<_, String>(0))?;
                rows.collect()
            })
            .await
    }
}
