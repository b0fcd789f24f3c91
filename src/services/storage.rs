// 键值存储模块
// 替代浏览器 localStorage：SQLite 持久化实现与内存实现共用同一接口

use crate::error::{TrialError, TrialResult};
use chrono::Utc;
use log::debug;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 批量写入中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

impl KvWrite {
    pub fn set(key: &str, value: String) -> Self {
        KvWrite::Set {
            key: key.to_string(),
            value,
        }
    }

    pub fn remove(key: &str) -> Self {
        KvWrite::Remove {
            key: key.to_string(),
        }
    }
}

/// 可注入的键值存储接口，值为 JSON 文本
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> TrialResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> TrialResult<()>;
    fn remove(&self, key: &str) -> TrialResult<()>;

    /// 全部生效或全部不生效
    fn apply(&self, batch: &[KvWrite]) -> TrialResult<()>;
}

// ==================== 内存存储 ====================

/// 内存存储，测试与临时会话使用
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> TrialResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| TrialError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> TrialResult<()> {
        let mut entries = self.entries.lock().map_err(|_| TrialError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> TrialResult<()> {
        let mut entries = self.entries.lock().map_err(|_| TrialError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn apply(&self, batch: &[KvWrite]) -> TrialResult<()> {
        let mut entries = self.entries.lock().map_err(|_| TrialError::LockPoisoned)?;
        for write in batch {
            match write {
                KvWrite::Set { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                KvWrite::Remove { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}

// ==================== SQLite 存储 ====================

const UPSERT_SQL: &str = "INSERT INTO kv_state (key, value, updated_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET
     value = excluded.value,
     updated_at = excluded.updated_at";

const DELETE_SQL: &str = "DELETE FROM kv_state WHERE key = ?1";

/// SQLite 键值存储
pub struct SqliteStore {
    pool: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// 打开（或创建）磁盘数据库
    pub fn open(db_path: &Path) -> TrialResult<Self> {
        // 确保数据目录存在
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;

        let store = Self {
            pool: Arc::new(Mutex::new(conn)),
            db_path: Some(db_path.to_path_buf()),
        };
        store.initialize()?;
        Ok(store)
    }

    /// 内存数据库
    pub fn open_in_memory() -> TrialResult<Self> {
        let store = Self {
            pool: Arc::new(Mutex::new(Connection::open_in_memory()?)),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// 初始化表结构
    pub fn initialize(&self) -> TrialResult<()> {
        let conn = self.pool.lock().map_err(|_| TrialError::LockPoisoned)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS kv_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        ",
        )?;

        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> TrialResult<Option<String>> {
        let conn = self.pool.lock().map_err(|_| TrialError::LockPoisoned)?;

        let value = conn
            .query_row(
                "SELECT value FROM kv_state WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        debug!("kv get {} -> {}", key, if value.is_some() { "hit" } else { "miss" });
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> TrialResult<()> {
        let conn = self.pool.lock().map_err(|_| TrialError::LockPoisoned)?;
        let now = Utc::now().to_rfc3339();

        conn.execute(UPSERT_SQL, rusqlite::params![key, value, now])?;

        debug!("kv set {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> TrialResult<()> {
        let conn = self.pool.lock().map_err(|_| TrialError::LockPoisoned)?;

        conn.execute(DELETE_SQL, rusqlite::params![key])?;

        debug!("kv remove {}", key);
        Ok(())
    }

    fn apply(&self, batch: &[KvWrite]) -> TrialResult<()> {
        let mut conn = self.pool.lock().map_err(|_| TrialError::LockPoisoned)?;
        let now = Utc::now().to_rfc3339();

        // 事务内执行，出错时 tx 被丢弃并自动回滚
        let tx = conn.transaction()?;
        for write in batch {
            match write {
                KvWrite::Set { key, value } => {
                    tx.execute(UPSERT_SQL, rusqlite::params![key, value, now])?;
                }
                KvWrite::Remove { key } => {
                    tx.execute(DELETE_SQL, rusqlite::params![key])?;
                }
            }
        }
        tx.commit()?;

        debug!("kv batch of {} write(s) committed", batch.len());
        Ok(())
    }
}
