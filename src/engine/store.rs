// Telos Engine: Persistent Store
// Durable storage for goals, interest patterns, state blobs, and the
// thought/memory append logs, in SQLite via rusqlite.
//
// This is the only component allowed to touch on-disk state. A single
// connection behind a Mutex keeps writes serialized; SQLite's per-statement
// atomicity gives all-or-nothing record writes, so a crash never leaves a
// partial record visible on recovery.
//
// The store never mutates domain objects; it only serializes and
// deserializes them. Ownership stays with the components.

use crate::atoms::constants::{STATE_KEY_WORKING_MEMORY, THOUGHT_LOG_CAP};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::*;

use chrono::{DateTime, Utc};
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default path for the engine database.
fn engine_db_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_default();
    let dir = home.join(".telos");
    std::fs::create_dir_all(&dir).ok();
    dir.join("engine.db")
}

/// Thread-safe database wrapper.
pub struct StateStore {
    conn: Mutex<Connection>,
}

impl StateStore {
    /// Open (or create) the database at the default location.
    pub fn open_default() -> EngineResult<Self> {
        Self::open(engine_db_path())
    }

    /// Open (or create) the database at `path` and initialize the schema.
    /// Failure here is the one unrecoverable startup condition.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        info!("[store] Opening state store at {:?}", path);

        let conn = Connection::open(path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS thoughts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                kind TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                context TEXT NOT NULL DEFAULT '[]',
                interests TEXT NOT NULL DEFAULT '[]',
                importance REAL NOT NULL DEFAULT 0.5
            );

            CREATE INDEX IF NOT EXISTS idx_thoughts_timestamp
                ON thoughts(timestamp DESC);

            CREATE TABLE IF NOT EXISTS memories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                kind TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                strength REAL NOT NULL DEFAULT 1.0,
                associations TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX IF NOT EXISTS idx_memories_strength
                ON memories(strength DESC);

            CREATE TABLE IF NOT EXISTS state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS goals (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                document TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_goals_status ON goals(status);

            CREATE TABLE IF NOT EXISTS interest_patterns (
                topic TEXT PRIMARY KEY,
                strength REAL NOT NULL,
                recency REAL NOT NULL,
                depth REAL NOT NULL,
                novelty REAL NOT NULL,
                utility REAL NOT NULL,
                last_engaged TEXT NOT NULL,
                engagement_count INTEGER NOT NULL DEFAULT 0,
                related_topics TEXT NOT NULL DEFAULT '[]'
            );
        ",
        )?;

        Ok(StateStore {
            conn: Mutex::new(conn),
        })
    }

    // ── Thought append log ──────────────────────────────────────────────

    /// Append a thought. The log is capped: inserting beyond the retention
    /// limit deletes the oldest rows, so the count never exceeds the cap.
    pub fn save_thought(
        &self,
        content: &str,
        kind: &str,
        context: &[String],
        interests: &[String],
        importance: f64,
    ) -> EngineResult<i64> {
        if !(0.0..=1.0).contains(&importance) {
            return Err(EngineError::validation(format!(
                "thought importance {} out of range [0, 1]",
                importance
            )));
        }

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO thoughts (content, kind, timestamp, context, interests, importance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                content,
                kind,
                Utc::now().to_rfc3339(),
                serde_json::to_string(context)?,
                serde_json::to_string(interests)?,
                importance,
            ],
        )?;
        let id = conn.last_insert_rowid();

        // Enforce the retention cap: oldest rows beyond the newest N go away.
        conn.execute(
            "DELETE FROM thoughts WHERE id NOT IN
             (SELECT id FROM thoughts ORDER BY id DESC LIMIT ?1)",
            params![THOUGHT_LOG_CAP],
        )?;

        Ok(id)
    }

    /// Most-recent-N thoughts, newest first.
    pub fn recent_thoughts(&self, limit: usize) -> EngineResult<Vec<ThoughtRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, kind, timestamp, context, interests, importance
             FROM thoughts ORDER BY id DESC LIMIT ?1",
        )?;

        let thoughts = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ThoughtRecord {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    kind: row.get(2)?,
                    timestamp: parse_timestamp(row.get::<_, String>(3)?, 3)?,
                    context: parse_string_list(row.get::<_, String>(4)?, 4)?,
                    interests: parse_string_list(row.get::<_, String>(5)?, 5)?,
                    importance: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(thoughts)
    }

    // ── Memory log ──────────────────────────────────────────────────────

    pub fn save_memory(
        &self,
        content: &str,
        kind: &str,
        strength: f64,
        associations: &[String],
    ) -> EngineResult<i64> {
        if !(0.0..=1.0).contains(&strength) {
            return Err(EngineError::validation(format!(
                "memory strength {} out of range [0, 1]",
                strength
            )));
        }

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO memories (content, kind, timestamp, strength, associations)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                content,
                kind,
                Utc::now().to_rfc3339(),
                strength,
                serde_json::to_string(associations)?,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Memories at or above `min_strength`, strongest first; ties broken by
    /// most recent first.
    pub fn strong_memories(
        &self,
        min_strength: f64,
        limit: usize,
    ) -> EngineResult<Vec<MemoryRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, kind, timestamp, strength, associations
             FROM memories
             WHERE strength >= ?1
             ORDER BY strength DESC, timestamp DESC
             LIMIT ?2",
        )?;

        let memories = stmt
            .query_map(params![min_strength, limit as i64], |row| {
                Ok(MemoryRecord {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    kind: row.get(2)?,
                    timestamp: parse_timestamp(row.get::<_, String>(3)?, 3)?,
                    strength: row.get(4)?,
                    associations: parse_string_list(row.get::<_, String>(5)?, 5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(memories)
    }

    // ── Versioned state blobs ───────────────────────────────────────────

    /// Store an arbitrary serializable blob under `key`, bumping its version.
    pub fn set_state<T: Serialize>(&self, key: &str, value: &T) -> EngineResult<()> {
        let json = serde_json::to_string(value)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO state (key, value, version, updated_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                version = state.version + 1,
                updated_at = excluded.updated_at",
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Load a blob by key. Returns Ok(None) when the key has never been set.
    /// A present-but-unparseable blob is a hard error; the caller decides
    /// whether the empty-state fallback applies.
    pub fn get_state<T: DeserializeOwned>(&self, key: &str) -> EngineResult<Option<T>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT value FROM state WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the working-memory context lines as one versioned blob.
    pub fn save_working_memory(&self, lines: &[String]) -> EngineResult<()> {
        self.set_state(STATE_KEY_WORKING_MEMORY, &lines)
    }

    /// Load the working-memory context, empty on first run.
    pub fn load_working_memory(&self) -> EngineResult<Vec<String>> {
        Ok(self
            .get_state(STATE_KEY_WORKING_MEMORY)?
            .unwrap_or_default())
    }

    // ── Goals ───────────────────────────────────────────────────────────

    /// Upsert a goal as a full nested JSON document. One row per goal,
    /// replaced atomically.
    pub fn save_goal(&self, goal: &Goal) -> EngineResult<()> {
        let document = serde_json::to_string(goal)?;
        let status = serde_json::to_string(&goal.status)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO goals (id, title, status, document, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                goal.id,
                goal.title,
                status.trim_matches('"'),
                document,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Load every persisted goal. A row that fails to deserialize is a hard
    /// error; the caller decides whether the empty-state fallback applies.
    pub fn load_goals(&self) -> EngineResult<Vec<Goal>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT document FROM goals ORDER BY updated_at ASC")?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut goals = Vec::with_capacity(rows.len());
        for json in rows {
            goals.push(serde_json::from_str::<Goal>(&json)?);
        }
        Ok(goals)
    }

    // ── Interest patterns ───────────────────────────────────────────────

    pub fn save_pattern(&self, pattern: &InterestPattern) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO interest_patterns
                (topic, strength, recency, depth, novelty, utility,
                 last_engaged, engagement_count, related_topics)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                pattern.topic,
                pattern.strength,
                pattern.recency,
                pattern.depth,
                pattern.novelty,
                pattern.utility,
                pattern.last_engaged.to_rfc3339(),
                pattern.engagement_count as i64,
                serde_json::to_string(&pattern.related_topics)?,
            ],
        )?;
        Ok(())
    }

    pub fn load_patterns(&self) -> EngineResult<Vec<InterestPattern>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT topic, strength, recency, depth, novelty, utility,
                    last_engaged, engagement_count, related_topics
             FROM interest_patterns",
        )?;

        let patterns = stmt
            .query_map([], |row| {
                Ok(InterestPattern {
                    topic: row.get(0)?,
                    strength: row.get(1)?,
                    recency: row.get(2)?,
                    depth: row.get(3)?,
                    novelty: row.get(4)?,
                    utility: row.get(5)?,
                    last_engaged: parse_timestamp(row.get::<_, String>(6)?, 6)?,
                    engagement_count: row.get::<_, i64>(7)? as u64,
                    related_topics: parse_string_list(row.get::<_, String>(8)?, 8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(patterns)
    }

    // ── Statistics ──────────────────────────────────────────────────────

    pub fn stats(&self) -> EngineResult<StoreStats> {
        let conn = self.conn.lock();

        let thought_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM thoughts", [], |r| r.get(0))?;
        let memory_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM memories", [], |r| r.get(0))?;
        let goal_count: i64 = conn.query_row("SELECT COUNT(*) FROM goals", [], |r| r.get(0))?;
        let interest_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM interest_patterns", [], |r| r.get(0))?;

        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |r| r.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |r| r.get(0))?;

        Ok(StoreStats {
            thought_count,
            memory_count,
            goal_count,
            interest_count,
            db_size_bytes: page_count * page_size,
        })
    }
}

// ── Row decoding helpers ───────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp column as a typed conversion failure, so a
/// corrupt row fails the whole load and the caller can react.
fn parse_timestamp(raw: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Decode a JSON string-array column, same failure contract as timestamps.
fn parse_string_list(raw: String, column: usize) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, StateStore) {
        let dir = TempDir::new().expect("temp dir");
        let store = StateStore::open(dir.path().join("test.db")).expect("open store");
        (dir, store)
    }

    #[test]
    fn thought_round_trip() {
        let (_dir, store) = open_temp();
        store
            .save_thought(
                "noticed a recurring structure",
                "observation",
                &["ctx".into()],
                &["patterns".into()],
                0.7,
            )
            .unwrap();

        let thoughts = store.recent_thoughts(10).unwrap();
        assert_eq!(thoughts.len(), 1);
        assert_eq!(thoughts[0].kind, "observation");
        assert_eq!(thoughts[0].interests, vec!["patterns".to_string()]);
        assert!((thoughts[0].importance - 0.7).abs() < 1e-9);
    }

    #[test]
    fn thought_importance_out_of_range_rejected() {
        let (_dir, store) = open_temp();
        let err = store
            .save_thought("x", "observation", &[], &[], 1.5)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(store.stats().unwrap().thought_count, 0);
    }

    #[test]
    fn thought_log_cap_evicts_oldest() {
        let (_dir, store) = open_temp();
        for i in 0..1200 {
            store
                .save_thought(&format!("thought {}", i), "stream", &[], &[], 0.5)
                .unwrap();
        }

        assert_eq!(store.stats().unwrap().thought_count, 1000);

        // The oldest 200 are unrecoverable via the recency query.
        let all = store.recent_thoughts(2000).unwrap();
        assert_eq!(all.len(), 1000);
        assert_eq!(all[0].content, "thought 1199");
        assert_eq!(all.last().unwrap().content, "thought 200");
    }

    #[test]
    fn strong_memories_filter_and_order() {
        let (_dir, store) = open_temp();
        store.save_memory("weak", "episodic", 0.2, &[]).unwrap();
        store.save_memory("mid", "episodic", 0.6, &[]).unwrap();
        store.save_memory("strong", "episodic", 0.9, &[]).unwrap();

        let found = store.strong_memories(0.5, 10).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].content, "strong");
        assert_eq!(found[1].content, "mid");
    }

    #[test]
    fn state_blob_versioning() {
        let (_dir, store) = open_temp();
        store.set_state("wm", &vec!["a".to_string()]).unwrap();
        store
            .set_state("wm", &vec!["a".to_string(), "b".to_string()])
            .unwrap();

        let loaded: Option<Vec<String>> = store.get_state("wm").unwrap();
        assert_eq!(loaded.unwrap().len(), 2);

        let missing: Option<Vec<String>> = store.get_state("nope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn working_memory_round_trip() {
        let (_dir, store) = open_temp();
        assert!(store.load_working_memory().unwrap().is_empty());

        store
            .save_working_memory(&["focus: recursion".to_string()])
            .unwrap();
        let loaded = store.load_working_memory().unwrap();
        assert_eq!(loaded, vec!["focus: recursion".to_string()]);
    }

    #[test]
    fn goal_document_round_trip() {
        use crate::engine::goals::tests_support::sample_goal;

        let (_dir, store) = open_temp();
        let goal = sample_goal("Persisted goal", &["criterion one", "criterion two"]);
        store.save_goal(&goal).unwrap();

        let loaded = store.load_goals().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, goal.id);
        assert_eq!(loaded[0].milestones.len(), 2);
        assert_eq!(loaded[0].actions.len(), 1);
        assert_eq!(loaded[0].status, GoalStatus::Planned);
    }

    #[test]
    fn corrupted_goal_document_fails_the_load() {
        use crate::engine::goals::tests_support::sample_goal;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = StateStore::open(&path).unwrap();
        store.save_goal(&sample_goal("Readable", &["c"])).unwrap();
        store.save_goal(&sample_goal("Mangled", &["c"])).unwrap();

        // Damage one row out-of-band, as a crash mid-write or a foreign
        // writer would.
        let raw = Connection::open(&path).unwrap();
        raw.execute(
            "UPDATE goals SET document = '{not json' WHERE title = 'Mangled'",
            [],
        )
        .unwrap();

        let err = store.load_goals().unwrap_err();
        assert!(matches!(err, EngineError::Serialization(_)));
    }

    #[test]
    fn corrupted_thought_row_fails_the_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = StateStore::open(&path).unwrap();
        store
            .save_thought("fine", "stream", &["ctx".into()], &[], 0.5)
            .unwrap();

        let raw = Connection::open(&path).unwrap();
        raw.execute("UPDATE thoughts SET context = 'oops'", [])
            .unwrap();

        let err = store.recent_thoughts(10).unwrap_err();
        assert!(matches!(err, EngineError::Database(_)));
    }

    #[test]
    fn corrupted_pattern_timestamp_fails_the_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = StateStore::open(&path).unwrap();
        let pattern = InterestPattern {
            topic: "graphs".into(),
            strength: 0.5,
            recency: 1.0,
            depth: 0.2,
            novelty: 0.6,
            utility: 0.5,
            last_engaged: Utc::now(),
            engagement_count: 1,
            related_topics: Vec::new(),
        };
        store.save_pattern(&pattern).unwrap();

        let raw = Connection::open(&path).unwrap();
        raw.execute("UPDATE interest_patterns SET last_engaged = 'yesterday'", [])
            .unwrap();

        let err = store.load_patterns().unwrap_err();
        assert!(matches!(err, EngineError::Database(_)));
    }

    #[test]
    fn pattern_round_trip() {
        let (_dir, store) = open_temp();
        let pattern = InterestPattern {
            topic: "temporal reasoning".into(),
            strength: 0.8,
            recency: 1.0,
            depth: 0.4,
            novelty: 0.6,
            utility: 0.5,
            last_engaged: Utc::now(),
            engagement_count: 3,
            related_topics: vec!["planning".into()],
        };
        store.save_pattern(&pattern).unwrap();

        let loaded = store.load_patterns().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].topic, "temporal reasoning");
        assert_eq!(loaded[0].engagement_count, 3);
        assert_eq!(loaded[0].related_topics, vec!["planning".to_string()]);
    }
}
