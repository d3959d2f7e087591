use crate::core::{Sink, SinkConnection};
use crate::domain::model::{AgeCounts, FlatRecord, StoredRecord};
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<StoredRecord>,
    last_id: i32,
    insert_attempts: usize,
    fail_on_insert: Option<usize>,
}

/// 行程內的交易式 sink；id 如同 serial 欄位，回滾後不會重用
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
    open_connections: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 第 n 次 insert（從 1 起算，跨連線累計）回傳錯誤
    pub fn fail_on_insert(self, attempt: usize) -> Self {
        if let Ok(mut state) = self.state.try_lock() {
            state.fail_on_insert = Some(attempt);
        }
        self
    }

    pub async fn records(&self) -> Vec<StoredRecord> {
        self.state.lock().await.rows.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn open_connections(&self) -> usize {
        self.open_connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for MemorySink {
    type Connection = MemoryConnection;

    async fn acquire(&self) -> Result<MemoryConnection> {
        self.open_connections.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection {
            state: Arc::clone(&self.state),
            open_connections: Arc::clone(&self.open_connections),
            pending: None,
        })
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }
}

pub struct MemoryConnection {
    state: Arc<Mutex<MemoryState>>,
    open_connections: Arc<AtomicUsize>,
    pending: Option<Vec<StoredRecord>>,
}

#[async_trait]
impl SinkConnection for MemoryConnection {
    async fn begin(&mut self) -> Result<()> {
        if self.pending.is_some() {
            return Err(IngestError::Sink {
                message: "transaction already in progress".to_string(),
            });
        }
        self.pending = Some(Vec::new());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let pending = self.pending.take().ok_or_else(|| IngestError::Sink {
            message: "commit without an open transaction".to_string(),
        })?;
        self.state.lock().await.rows.extend(pending);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(discarded) => {
                tracing::debug!("Rolled back {} pending rows", discarded.len());
                Ok(())
            }
            None => Err(IngestError::Sink {
                message: "rollback without an open transaction".to_string(),
            }),
        }
    }

    async fn insert(&mut self, record: &FlatRecord) -> Result<i32> {
        let mut state = self.state.lock().await;
        state.insert_attempts += 1;
        if state.fail_on_insert == Some(state.insert_attempts) {
            return Err(IngestError::Sink {
                message: format!("simulated failure on insert #{}", state.insert_attempts),
            });
        }

        state.last_id += 1;
        let stored = StoredRecord {
            id: state.last_id,
            record: record.clone(),
        };

        match self.pending.as_mut() {
            Some(pending) => pending.push(stored),
            None => state.rows.push(stored),
        }
        Ok(state.last_id)
    }

    async fn age_counts(&mut self) -> Result<AgeCounts> {
        let state = self.state.lock().await;
        Ok(AgeCounts::from_ages(state.rows.iter().map(|row| row.record.age)))
    }

    async fn fetch_records(&mut self, limit: usize) -> Result<Vec<StoredRecord>> {
        let state = self.state.lock().await;
        let mut rows = state.rows.clone();
        rows.sort_by_key(|row| row.id);
        rows.truncate(limit);
        Ok(rows)
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::warn!(
                "Connection released with an open transaction; discarding {} rows",
                pending.len()
            );
        }
        self.open_connections.fetch_sub(1, Ordering::SeqCst);
    }
}
