mod common;

use std::sync::Arc;

use common::*;
use xexplorer::respository::{
  Input, MemPoolRepository, MemoryRepository, Output, Transaction, TransactionRepository, TwoLevelRepository,
};

fn transaction(label: &str, block_number: Option<u64>, time: i64, from: Option<&str>, to: &str) -> Transaction {
  let id = txid(label);
  Transaction {
    id: id.clone(),
    block_number,
    block_hash: block_number.map(block_hash),
    time,
    size: 100,
    inputs: from
      .map(|address| {
        vec![Input {
          tx_id: id.clone(),
          parent_tx_id: txid("parent"),
          vout: 0,
          address: Some(address.to_string()),
          value: dec("2"),
        }]
      })
      .unwrap_or_default(),
    outputs: vec![Output {
      tx_id: id.clone(),
      address: Some(to.to_string()),
      value: dec("1.5"),
      vout: 0,
    }],
  }
}

fn two_level() -> (Arc<MemPoolRepository>, Arc<MemoryRepository>, TwoLevelRepository) {
  let mem_pool = Arc::new(MemPoolRepository::new());
  let confirmed = Arc::new(MemoryRepository::new());
  let repository = TwoLevelRepository::new(mem_pool.clone(), confirmed.clone());
  (mem_pool, confirmed, repository)
}

#[tokio::test]
async fn mempool_indexes_by_address_and_deletes_cleanly() -> anyhow::Result<()> {
  let mem_pool = MemPoolRepository::new();
  assert!(mem_pool.try_add(transaction("t1", None, 1, Some(ADDRESS_A), ADDRESS_B)).await);
  assert!(mem_pool.try_add(transaction("t2", None, 2, Some(ADDRESS_B), ADDRESS_C)).await);
  // duplicate id
  assert!(!mem_pool.try_add(transaction("t1", None, 1, Some(ADDRESS_A), ADDRESS_B)).await);

  let for_b: Vec<String> = mem_pool.find_by_address(ADDRESS_B).await?.into_iter().map(|t| t.id).collect();
  assert_eq!(for_b.len(), 2);
  assert!(for_b.contains(&txid("t1")) && for_b.contains(&txid("t2")));

  let last: Vec<String> = mem_pool.get_last(1).await?.into_iter().map(|t| t.id).collect();
  assert_eq!(last, vec![txid("t2")]);

  assert!(mem_pool.delete(&txid("t1")).await);
  assert!(!mem_pool.delete(&txid("t1")).await);
  assert!(mem_pool.find_by_address(ADDRESS_A).await?.is_empty());
  assert_eq!(mem_pool.find_by_address(ADDRESS_B).await?.len(), 1);
  // delete leaves no tombstone
  assert!(!mem_pool.contains(&txid("t1")).await);
  assert!(mem_pool.try_add(transaction("t1", None, 1, Some(ADDRESS_A), ADDRESS_B)).await);
  Ok(())
}

#[tokio::test]
async fn cleared_ids_are_never_reinserted() -> anyhow::Result<()> {
  let mem_pool = MemPoolRepository::new();
  mem_pool.add(transaction("t1", None, 1, None, ADDRESS_A)).await?;
  mem_pool.add(transaction("t2", None, 1, None, ADDRESS_A)).await?;

  assert_eq!(mem_pool.clear().await, 2);
  assert!(mem_pool.is_empty().await);
  assert!(mem_pool.contains(&txid("t1")).await);
  assert!(mem_pool.find_by_address(ADDRESS_A).await?.is_empty());

  mem_pool.add(transaction("t1", None, 1, None, ADDRESS_A)).await?;
  assert!(mem_pool.find(&txid("t1")).await?.is_none());
  assert!(mem_pool.transaction_ids().await.is_empty());
  Ok(())
}

#[tokio::test]
async fn writes_are_routed_by_block_number() -> anyhow::Result<()> {
  let (mem_pool, confirmed, repository) = two_level();

  repository.add(transaction("pool", None, 5, None, ADDRESS_A)).await?;
  repository.add(transaction("block", Some(7), 3, None, ADDRESS_A)).await?;

  assert_eq!(mem_pool.len().await, 1);
  assert_eq!(confirmed.len().await, 1);
  assert_eq!(repository.get_block_number().await?, Some(7));
  assert!(repository.find_by_block(&block_hash(7)).await?.len() == 1);
  Ok(())
}

#[tokio::test]
async fn confirmation_wins_over_a_late_pool_copy() -> anyhow::Result<()> {
  let (mem_pool, _confirmed, repository) = two_level();
  let pooled = transaction("t", None, 5, Some(ADDRESS_A), ADDRESS_B);

  repository.add(pooled.clone()).await?;
  assert_eq!(repository.find(&pooled.id).await?.expect("pooled").block_number, None);

  let mut confirmed_copy = pooled.clone();
  confirmed_copy.block_number = Some(1000);
  confirmed_copy.block_hash = Some(block_hash(1000));
  repository.add_range(vec![confirmed_copy]).await?;
  mem_pool.clear().await;

  // delayed duplicate of the old pool copy
  repository.add(pooled.clone()).await?;

  let found = repository.find(&pooled.id).await?.expect("confirmed");
  assert_eq!(found.block_number, Some(1000));
  Ok(())
}

#[tokio::test]
async fn reads_merge_both_levels() -> anyhow::Result<()> {
  let (_mem_pool, _confirmed, repository) = two_level();
  repository.add(transaction("old", Some(1), 10, None, ADDRESS_A)).await?;
  repository.add(transaction("older", Some(1), 5, None, ADDRESS_A)).await?;
  repository.add(transaction("new", None, 20, Some(ADDRESS_A), ADDRESS_B)).await?;

  let ids = vec![txid("new"), txid("old"), txid("missing")];
  let found: Vec<String> = repository.find_all(&ids).await?.into_iter().map(|t| t.id).collect();
  assert_eq!(found, vec![txid("new"), txid("old")]);

  let by_address: Vec<String> = repository.find_by_address(ADDRESS_A).await?.into_iter().map(|t| t.id).collect();
  assert_eq!(by_address, vec![txid("new"), txid("old"), txid("older")]);

  let last: Vec<String> = repository.get_last(2).await?.into_iter().map(|t| t.id).collect();
  assert_eq!(last, vec![txid("new"), txid("old")]);
  Ok(())
}

#[tokio::test]
async fn add_range_replaces_rows_of_the_same_block() -> anyhow::Result<()> {
  let confirmed = MemoryRepository::new();
  let first = vec![
    transaction("a", Some(3), 1, None, ADDRESS_A),
    transaction("b", Some(3), 1, None, ADDRESS_A),
  ];
  confirmed.add_range(first.clone()).await?;
  confirmed.add_range(first).await?;
  assert_eq!(confirmed.len().await, 2);

  confirmed.add_range(vec![transaction("c", Some(3), 1, None, ADDRESS_B)]).await?;
  assert_eq!(confirmed.len().await, 1);
  assert!(confirmed.find_by_address(ADDRESS_A).await?.is_empty());
  Ok(())
}

#[tokio::test]
async fn tombstones_expire_after_the_configured_number_of_clears() -> anyhow::Result<()> {
  let mem_pool = MemPoolRepository::with_tombstone_generations(2);
  mem_pool.add(transaction("t1", None, 1, None, ADDRESS_A)).await?;

  mem_pool.clear().await;
  mem_pool.clear().await;
  assert!(mem_pool.contains(&txid("t1")).await);
  assert!(!mem_pool.try_add(transaction("t1", None, 1, None, ADDRESS_A)).await);

  mem_pool.clear().await;
  assert!(!mem_pool.contains(&txid("t1")).await);
  assert!(mem_pool.try_add(transaction("t1", None, 1, None, ADDRESS_A)).await);
  Ok(())
}
