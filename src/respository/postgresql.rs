// src/respository/postgresql.rs
use crate::respository::model::{Input, Output, Transaction};
use crate::types::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use std::collections::HashMap;

pub async fn connect_db(db_url: &str) -> Result<PgPool, sqlx::Error> {
  PgPoolOptions::new()
    .max_connections(5) // Adjust pool size as needed
    .connect(db_url)
    .await
}

pub const TRANSACTIONS_TABLE: &str = "transactions";
pub const ADDRESSES_TABLE: &str = "addresses";

// Ensure the index tables exist
pub async fn setup_db_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
  sqlx::query(&format!(
    r#"
        CREATE TABLE IF NOT EXISTS {} (
            id VARCHAR(64) PRIMARY KEY,
            block_number BIGINT NOT NULL,
            block_hash VARCHAR(64) NOT NULL,
            time BIGINT NOT NULL,
            size INTEGER NOT NULL
        )
        "#,
    TRANSACTIONS_TABLE
  ))
    .execute(pool)
    .await?;

  // side = false for inputs, true for outputs
  sqlx::query(&format!(
    r#"
        CREATE TABLE IF NOT EXISTS {} (
            tx_id VARCHAR(64) NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
            side BOOLEAN NOT NULL,
            address VARCHAR(64),
            value NUMERIC(28, 8) NOT NULL,
            vout INTEGER NOT NULL,
            parent_tx_id VARCHAR(64)
        )
        "#,
    ADDRESSES_TABLE, TRANSACTIONS_TABLE
  ))
    .execute(pool)
    .await?;

  for statement in [
    format!("CREATE INDEX IF NOT EXISTS idx_transactions_block_number ON {} (block_number)", TRANSACTIONS_TABLE),
    format!("CREATE INDEX IF NOT EXISTS idx_transactions_block_hash ON {} (block_hash)", TRANSACTIONS_TABLE),
    format!("CREATE INDEX IF NOT EXISTS idx_transactions_time ON {} (time DESC)", TRANSACTIONS_TABLE),
    format!("CREATE INDEX IF NOT EXISTS idx_addresses_address ON {} (address)", ADDRESSES_TABLE),
    format!("CREATE INDEX IF NOT EXISTS idx_addresses_tx_id ON {} (tx_id)", ADDRESSES_TABLE),
  ] {
    sqlx::query(&statement).execute(pool).await?;
  }
  Ok(())
}

const SELECT_COLUMNS: &str = "t.id, t.block_number, t.block_hash, t.time, t.size, a.side, a.address, a.value, a.vout, a.parent_tx_id";

/// Replaces every row of the range's block number, then inserts the range, in one DB transaction.
pub async fn add_range(pool: &PgPool, transactions: &[Transaction]) -> Result<(), AppError> {
  let Some(block_number) = transactions.first().and_then(|tx| tx.block_number) else {
    return Ok(());
  };

  let mut db_tx = pool.begin().await?;

  sqlx::query(&format!("DELETE FROM {} WHERE block_number = $1", TRANSACTIONS_TABLE))
    .bind(block_number as i64)
    .execute(&mut *db_tx)
    .await
    .map_err(|e| AppError::Database(format!("Failed to delete block {}: {}", block_number, e)))?;

  for tx in transactions {
    insert(&mut db_tx, tx).await?;
  }

  db_tx.commit().await?;
  Ok(())
}

pub async fn add(pool: &PgPool, tx: &Transaction) -> Result<(), AppError> {
  let mut db_tx = pool.begin().await?;
  insert(&mut db_tx, tx).await?;
  db_tx.commit().await?;
  Ok(())
}

async fn insert(db_tx: &mut sqlx::Transaction<'_, Postgres>, tx: &Transaction) -> Result<(), AppError> {
  let block_number = tx
    .block_number
    .ok_or_else(|| AppError::Database(format!("Transaction {} has no block number", tx.id)))?;

  sqlx::query(&format!(
    r#"
        INSERT INTO {0} (id, block_number, block_hash, time, size)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE
        SET block_number = $2, block_hash = $3, time = $4, size = $5
        "#,
    TRANSACTIONS_TABLE
  ))
    .bind(&tx.id)
    .bind(block_number as i64) // Bind as i64 if column is BIGINT
    .bind(tx.block_hash.as_deref().unwrap_or_default())
    .bind(tx.time)
    .bind(tx.size as i32)
    .execute(&mut **db_tx)
    .await
    .map_err(|e| AppError::Database(format!("Failed to upsert transaction {}: {}", tx.id, e)))?;

  sqlx::query(&format!("DELETE FROM {} WHERE tx_id = $1", ADDRESSES_TABLE))
    .bind(&tx.id)
    .execute(&mut **db_tx)
    .await?;

  let insert_address = format!(
    "INSERT INTO {} (tx_id, side, address, value, vout, parent_tx_id) VALUES ($1, $2, $3, $4, $5, $6)",
    ADDRESSES_TABLE
  );
  for input in &tx.inputs {
    sqlx::query(&insert_address)
      .bind(&tx.id)
      .bind(false)
      .bind(input.address.as_deref())
      .bind(input.value)
      .bind(input.vout as i32)
      .bind(Some(input.parent_tx_id.as_str()))
      .execute(&mut **db_tx)
      .await?;
  }
  for output in &tx.outputs {
    sqlx::query(&insert_address)
      .bind(&tx.id)
      .bind(true)
      .bind(output.address.as_deref())
      .bind(output.value)
      .bind(output.vout as i32)
      .bind(None::<&str>)
      .execute(&mut **db_tx)
      .await?;
  }
  Ok(())
}

pub async fn find(pool: &PgPool, txid: &str) -> Result<Option<Transaction>, AppError> {
  let rows = sqlx::query(&format!(
    "SELECT {} FROM {} AS t INNER JOIN {} AS a ON t.id = a.tx_id WHERE t.id = $1",
    SELECT_COLUMNS, TRANSACTIONS_TABLE, ADDRESSES_TABLE
  ))
    .bind(txid)
    .fetch_all(pool)
    .await?;

  Ok(read_transactions(&rows)?.into_iter().next())
}

pub async fn find_all(pool: &PgPool, txids: &[String]) -> Result<Vec<Transaction>, AppError> {
  if txids.is_empty() {
    return Ok(Vec::new());
  }
  let rows = sqlx::query(&format!(
    "SELECT {} FROM {} AS t INNER JOIN {} AS a ON t.id = a.tx_id WHERE t.id = ANY($1)",
    SELECT_COLUMNS, TRANSACTIONS_TABLE, ADDRESSES_TABLE
  ))
    .bind(txids)
    .fetch_all(pool)
    .await?;

  read_transactions(&rows)
}

pub async fn find_by_block(pool: &PgPool, block_hash: &str) -> Result<Vec<Transaction>, AppError> {
  let rows = sqlx::query(&format!(
    "SELECT {} FROM {} AS t INNER JOIN {} AS a ON t.id = a.tx_id WHERE t.block_hash = $1",
    SELECT_COLUMNS, TRANSACTIONS_TABLE, ADDRESSES_TABLE
  ))
    .bind(block_hash)
    .fetch_all(pool)
    .await?;

  read_transactions(&rows)
}

pub async fn find_by_address(pool: &PgPool, address: &str) -> Result<Vec<Transaction>, AppError> {
  let rows = sqlx::query(&format!(
    r#"
        SELECT {0} FROM {1} AS t
        INNER JOIN {2} AS a ON t.id = a.tx_id
        WHERE t.id IN (SELECT x.tx_id FROM {2} AS x WHERE x.address = $1)
        "#,
    SELECT_COLUMNS, TRANSACTIONS_TABLE, ADDRESSES_TABLE
  ))
    .bind(address)
    .fetch_all(pool)
    .await?;

  read_transactions(&rows)
}

pub async fn get_last(pool: &PgPool, count: usize) -> Result<Vec<Transaction>, AppError> {
  let rows = sqlx::query(&format!(
    r#"
        SELECT {0} FROM (SELECT * FROM {1} ORDER BY time DESC LIMIT $1) AS t
        INNER JOIN {2} AS a ON t.id = a.tx_id
        ORDER BY t.time DESC
        "#,
    SELECT_COLUMNS, TRANSACTIONS_TABLE, ADDRESSES_TABLE
  ))
    .bind(count as i64)
    .fetch_all(pool)
    .await?;

  read_transactions(&rows)
}

pub async fn get_block_number(pool: &PgPool) -> Result<Option<u64>, AppError> {
  let row: (Option<i64>,) = sqlx::query_as(&format!("SELECT MAX(block_number) FROM {}", TRANSACTIONS_TABLE))
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::Database(format!("DB query failed: {}", e)))?;

  Ok(row.0.map(|n| n as u64))
}

/// Folds joined (transaction, address row) pairs back into transactions, keeping row order.
fn read_transactions(rows: &[PgRow]) -> Result<Vec<Transaction>, AppError> {
  let mut transactions: Vec<Transaction> = Vec::new();
  let mut positions: HashMap<String, usize> = HashMap::new();

  for row in rows {
    let id: String = row.try_get("id")?;
    let position = match positions.get(&id) {
      Some(position) => *position,
      None => {
        let block_number: i64 = row.try_get("block_number")?;
        let block_hash: String = row.try_get("block_hash")?;
        let size: i32 = row.try_get("size")?;
        transactions.push(Transaction {
          id: id.clone(),
          block_number: Some(block_number as u64),
          block_hash: Some(block_hash),
          time: row.try_get("time")?,
          size: size as u32,
          inputs: Vec::new(),
          outputs: Vec::new(),
        });
        positions.insert(id.clone(), transactions.len() - 1);
        transactions.len() - 1
      }
    };

    let side: bool = row.try_get("side")?;
    let address: Option<String> = row.try_get("address")?;
    let value: Decimal = row.try_get("value")?;
    let vout: i32 = row.try_get("vout")?;
    let transaction = &mut transactions[position];
    if side {
      transaction.outputs.push(Output {
        tx_id: id,
        address,
        value,
        vout: vout as u32,
      });
    } else {
      let parent_tx_id: Option<String> = row.try_get("parent_tx_id")?;
      transaction.inputs.push(Input {
        tx_id: id,
        parent_tx_id: parent_tx_id.unwrap_or_default(),
        vout: vout as u32,
        address,
        value,
      });
    }
  }

  Ok(transactions)
}
