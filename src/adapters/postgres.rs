use crate::core::{Sink, SinkConnection};
use crate::domain::model::{AgeCounts, FlatRecord, StoredRecord};
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Postgres;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS public.users (
    "name" varchar NOT NULL,
    age int4 NOT NULL,
    address jsonb NULL,
    additional_info jsonb NULL,
    id serial4 NOT NULL PRIMARY KEY
)
"#;

const INSERT_USER: &str = r#"
INSERT INTO public.users (name, age, address, additional_info)
VALUES ($1, $2, $3, $4)
RETURNING id
"#;

// 區間需與 core::report::AgeBucket::classify 一致
const AGE_COUNTS: &str = r#"
SELECT
    COUNT(*) AS total_count,
    COUNT(*) FILTER (WHERE age < 20) AS under_20,
    COUNT(*) FILTER (WHERE age >= 20 AND age <= 40) AS between_20_40,
    COUNT(*) FILTER (WHERE age > 40 AND age <= 60) AS between_40_60,
    COUNT(*) FILTER (WHERE age > 60) AS over_60
FROM public.users
"#;

const SELECT_USERS: &str = r#"
SELECT id, name, age, address, additional_info
FROM public.users
ORDER BY id
LIMIT $1
"#;

#[derive(Debug, Clone)]
pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        tracing::info!("🔌 Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Sink for PostgresSink {
    type Connection = PostgresConnection;

    async fn acquire(&self) -> Result<PostgresConnection> {
        let conn = self.pool.acquire().await?;
        Ok(PostgresConnection {
            conn: Some(conn),
            in_transaction: false,
        })
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        tracing::info!("Users table ready");
        Ok(())
    }
}

pub struct PostgresConnection {
    conn: Option<PoolConnection<Postgres>>,
    in_transaction: bool,
}

impl PostgresConnection {
    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| IngestError::Sink {
                message: "connection already released".to_string(),
            })
    }

    async fn run(&mut self, statement: &str) -> Result<()> {
        sqlx::Executor::execute(self.conn()?, statement).await?;
        Ok(())
    }
}

#[async_trait]
impl SinkConnection for PostgresConnection {
    async fn begin(&mut self) -> Result<()> {
        self.run("BEGIN").await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.run("COMMIT").await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        // ROLLBACK 失敗時保留旗標，讓 Drop 關閉這條連線而不是還給連線池
        self.run("ROLLBACK").await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn insert(&mut self, record: &FlatRecord) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(INSERT_USER)
            .bind(&record.name)
            .bind(record.age)
            .bind(record.address.clone().map(Json))
            .bind(record.additional_info.clone().map(Json))
            .fetch_one(self.conn()?)
            .await?;
        Ok(id)
    }

    async fn age_counts(&mut self) -> Result<AgeCounts> {
        let (total, under_20, between_20_40, between_40_60, over_60): (i64, i64, i64, i64, i64) =
            sqlx::query_as(AGE_COUNTS).fetch_one(self.conn()?).await?;

        let count = |n: i64| u64::try_from(n).unwrap_or(0);
        let counts = AgeCounts {
            total: count(total),
            under_20: count(under_20),
            between_20_40: count(between_20_40),
            between_40_60: count(between_40_60),
            over_60: count(over_60),
        };
        Ok(counts)
    }

    async fn fetch_records(&mut self, limit: usize) -> Result<Vec<StoredRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<(i32, String, i32, Option<Json<serde_json::Value>>, Option<Json<serde_json::Value>>)> =
            sqlx::query_as(SELECT_USERS)
                .bind(limit)
                .fetch_all(self.conn()?)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, age, address, additional_info)| StoredRecord {
                id,
                record: FlatRecord {
                    name,
                    age,
                    address: address.map(|Json(v)| v),
                    additional_info: additional_info.map(|Json(v)| v),
                },
            })
            .collect())
    }
}

impl Drop for PostgresConnection {
    fn drop(&mut self) {
        // 交易未結束就歸還會污染連線池，直接關閉這條連線
        if self.in_transaction {
            if let Some(conn) = self.conn.take() {
                tracing::warn!("Connection released with an open transaction; closing it");
                drop(conn.detach());
            }
        }
    }
}
