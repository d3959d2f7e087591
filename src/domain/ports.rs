use crate::domain::model::{AgeCounts, FlatRecord, StoredRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 關聯式儲存端；每次請求 acquire 一條連線，連線 drop 即歸還
#[async_trait]
pub trait Sink: Send + Sync {
    type Connection: SinkConnection;

    async fn acquire(&self) -> Result<Self::Connection>;

    /// 建立 users 表（已存在則略過）
    async fn ensure_schema(&self) -> Result<()>;
}

#[async_trait]
pub trait SinkConnection: Send {
    async fn begin(&mut self) -> Result<()>;
    async fn commit(&mut self) -> Result<()>;
    async fn rollback(&mut self) -> Result<()>;

    /// 插入一筆紀錄並回傳 sink 指派的 id
    async fn insert(&mut self, record: &FlatRecord) -> Result<i32>;

    async fn age_counts(&mut self) -> Result<AgeCounts>;

    async fn fetch_records(&mut self, limit: usize) -> Result<Vec<StoredRecord>>;
}

pub trait ConfigProvider: Send + Sync {
    fn csv_path(&self) -> Option<&str>;
    fn required_fields(&self) -> Vec<String>;
    fn report_after_ingest(&self) -> bool;
}
