use crate::respository::model::{Input, Output, Transaction};
use crate::respository::r#trait::TransactionRepository;
use crate::types::AppError;
use async_trait::async_trait;
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Number of `clear` calls a tombstone survives.
pub const TOMBSTONE_GENERATIONS: usize = 16;

#[derive(Default)]
struct MemPoolState {
    // txid -> transaction
    transactions: HashMap<String, Transaction>,
    // address -> inputs spending from it
    inputs: HashMap<String, Vec<Input>>,
    // address -> outputs paying to it
    outputs: HashMap<String, Vec<Output>>,
    // ids cleared after confirmation, one set per clear(), newest last
    deleted: VecDeque<HashSet<String>>,
}

impl MemPoolState {
    fn is_tombstoned(&self, txid: &str) -> bool {
        self.deleted.iter().any(|generation| generation.contains(txid))
    }
}

/// Unconfirmed pool store. Every read takes the read lock and every mutation
/// the write lock; no I/O happens while either is held.
///
/// Tombstones are kept for the last `tombstone_generations` clears. Older ones
/// are dropped; by then the confirmed store holds those ids.
#[derive(Clone)]
pub struct MemPoolRepository {
    state: Arc<RwLock<MemPoolState>>,
    tombstone_generations: usize,
}

impl Default for MemPoolRepository {
    fn default() -> Self {
        Self::with_tombstone_generations(TOMBSTONE_GENERATIONS)
    }
}

impl MemPoolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tombstone_generations(generations: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(MemPoolState::default())),
            tombstone_generations: generations.max(1),
        }
    }

    /// Inserts `tx` unless its id is live or tombstoned. Returns whether it was inserted.
    pub async fn try_add(&self, tx: Transaction) -> bool {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if state.is_tombstoned(&tx.id) {
            debug!("[MemPool] {} was already confirmed, ignoring", tx.id);
            return false;
        }
        if state.transactions.contains_key(&tx.id) {
            return false;
        }

        for input in &tx.inputs {
            if let Some(address) = &input.address {
                state.inputs.entry(address.clone()).or_default().push(input.clone());
            }
        }
        for output in &tx.outputs {
            if let Some(address) = &output.address {
                state.outputs.entry(address.clone()).or_default().push(output.clone());
            }
        }
        state.transactions.insert(tx.id.clone(), tx);
        true
    }

    /// True for live ids and for ids tombstoned by a recent `clear`.
    pub async fn contains(&self, txid: &str) -> bool {
        let state = self.state.read().await;
        state.transactions.contains_key(txid) || state.is_tombstoned(txid)
    }

    pub async fn delete(&self, txid: &str) -> bool {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let Some(tx) = state.transactions.remove(txid) else {
            return false;
        };
        for address in tx.inputs.iter().filter_map(|i| i.address.as_ref()) {
            if let Some(inputs) = state.inputs.get_mut(address) {
                inputs.retain(|i| i.tx_id != tx.id);
                if inputs.is_empty() {
                    state.inputs.remove(address);
                }
            }
        }
        for address in tx.outputs.iter().filter_map(|o| o.address.as_ref()) {
            if let Some(outputs) = state.outputs.get_mut(address) {
                outputs.retain(|o| o.tx_id != tx.id);
                if outputs.is_empty() {
                    state.outputs.remove(address);
                }
            }
        }
        true
    }

    /// Tombstones every live id and wipes all indexes under a single write lock.
    /// Each call opens a new tombstone generation, even when the pool is empty.
    pub async fn clear(&self) -> usize {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let ids: HashSet<String> = state.transactions.drain().map(|(id, _)| id).collect();
        let cleared = ids.len();
        state.deleted.push_back(ids);
        while state.deleted.len() > self.tombstone_generations {
            if let Some(expired) = state.deleted.pop_front() {
                debug!("[MemPool] Dropped {} expired tombstones", expired.len());
            }
        }
        state.inputs.clear();
        state.outputs.clear();
        cleared
    }

    pub async fn transaction_ids(&self) -> HashSet<String> {
        self.state.read().await.transactions.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.transactions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TransactionRepository for MemPoolRepository {
    async fn add(&self, tx: Transaction) -> Result<(), AppError> {
        self.try_add(tx).await;
        Ok(())
    }

    async fn add_range(&self, transactions: Vec<Transaction>) -> Result<(), AppError> {
        for tx in transactions {
            self.try_add(tx).await;
        }
        Ok(())
    }

    async fn find(&self, txid: &str) -> Result<Option<Transaction>, AppError> {
        Ok(self.state.read().await.transactions.get(txid).cloned())
    }

    async fn find_all(&self, txids: &[String]) -> Result<Vec<Transaction>, AppError> {
        let state = self.state.read().await;
        Ok(txids
            .iter()
            .filter_map(|txid| state.transactions.get(txid).cloned())
            .collect())
    }

    async fn find_by_block(&self, block_hash: &str) -> Result<Vec<Transaction>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .values()
            .filter(|tx| tx.block_hash.as_deref() == Some(block_hash))
            .cloned()
            .collect())
    }

    async fn find_by_address(&self, address: &str) -> Result<Vec<Transaction>, AppError> {
        let state = self.state.read().await;

        let mut seen = HashSet::new();
        let mut transactions = Vec::new();
        let input_ids = state.inputs.get(address).into_iter().flatten().map(|i| &i.tx_id);
        let output_ids = state.outputs.get(address).into_iter().flatten().map(|o| &o.tx_id);
        for txid in input_ids.chain(output_ids) {
            if seen.insert(txid.clone()) {
                if let Some(tx) = state.transactions.get(txid) {
                    transactions.push(tx.clone());
                }
            }
        }
        Ok(transactions)
    }

    async fn get_last(&self, count: usize) -> Result<Vec<Transaction>, AppError> {
        let state = self.state.read().await;
        let mut transactions: Vec<&Transaction> = state.transactions.values().collect();
        transactions.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(transactions.into_iter().take(count).cloned().collect())
    }

    async fn get_block_number(&self) -> Result<Option<u64>, AppError> {
        let state = self.state.read().await;
        Ok(state.transactions.values().filter_map(|tx| tx.block_number).max())
    }
}
