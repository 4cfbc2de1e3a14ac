use serde_json::json;
use xexplorer::coin::{ChainRpc, RpcClient};
use xexplorer::types::AppError;

const HASH_1: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const HASH_3: &str = "0000000000000000000000000000000000000000000000000000000000000003";

fn out_of_order_batch() -> String {
  json!([
    { "id": 3, "result": HASH_3, "error": null },
    { "id": 1, "result": HASH_1, "error": null },
    { "id": 2, "result": null, "error": { "code": -8, "message": "Block height out of range" } }
  ])
  .to_string()
}

#[tokio::test]
async fn batch_results_follow_request_order() -> anyhow::Result<()> {
  let mut server = mockito::Server::new_async().await;
  let mock = server
    .mock("POST", "/")
    .match_header("authorization", "Basic dXNlcjpwYXNz")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(out_of_order_batch())
    .create_async()
    .await;

  let client = RpcClient::new(server.url()).with_credentials("user".to_string(), Some("pass".to_string()));
  let results = client
    .call_batch(&[
      ("getblockhash", json!([10])),
      ("getblockhash", json!([11])),
      ("getblockhash", json!([12])),
    ])
    .await?;

  assert_eq!(results.len(), 3);
  assert_eq!(results[0], Some(json!(HASH_1)));
  assert_eq!(results[1], None);
  assert_eq!(results[2], Some(json!(HASH_3)));
  mock.assert_async().await;
  Ok(())
}

#[tokio::test]
async fn typed_batch_drops_failed_members() -> anyhow::Result<()> {
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("POST", "/")
    .with_status(200)
    .with_body(out_of_order_batch())
    .create_async()
    .await;

  let client = RpcClient::new(server.url());
  let hashes = client.get_block_hashes(&[10, 11, 12]).await?;

  assert_eq!(hashes, vec![HASH_1.to_string(), HASH_3.to_string()]);
  Ok(())
}

#[tokio::test]
async fn single_call_error_payload_is_none() -> anyhow::Result<()> {
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("POST", "/")
    .with_status(500)
    .with_body(json!({ "id": 1, "result": null, "error": { "code": -5, "message": "Block not found" } }).to_string())
    .create_async()
    .await;

  let client = RpcClient::new(server.url());
  assert!(client.get_block(HASH_1).await?.is_none());
  Ok(())
}

#[tokio::test]
async fn block_payload_is_decoded() -> anyhow::Result<()> {
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("POST", "/")
    .match_body(mockito::Matcher::PartialJson(json!({ "method": "getblock", "params": [HASH_1] })))
    .with_status(200)
    .with_body(
      json!({
        "id": 1,
        "error": null,
        "result": {
          "hash": HASH_1,
          "height": 42,
          "size": 1234,
          "time": 1600000000,
          "confirmations": -1,
          "tx": ["aa", "bb"],
          "flags": "proof-of-stake",
          "mint": 1.25
        }
      })
      .to_string(),
    )
    .create_async()
    .await;

  let client = RpcClient::new(server.url());
  let block = client.get_block(HASH_1).await?.expect("block");

  assert_eq!(block.height, 42);
  assert_eq!(block.confirmations, -1);
  assert_eq!(block.tx, vec!["aa".to_string(), "bb".to_string()]);
  assert_eq!(block.mint.map(|m| m.to_string()), Some("1.25".to_string()));
  Ok(())
}

#[tokio::test]
async fn non_array_batch_body_is_an_error() -> anyhow::Result<()> {
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("POST", "/")
    .with_status(200)
    .with_body(json!({ "id": null, "result": null, "error": { "code": -32700, "message": "Parse error" } }).to_string())
    .create_async()
    .await;

  let client = RpcClient::new(server.url());
  let result = client.call_batch(&[("getblockhash", json!([1]))]).await;

  assert!(matches!(result, Err(AppError::Rpc(_))));
  Ok(())
}

#[tokio::test]
async fn unreachable_daemon_is_a_client_error() {
  let client = RpcClient::new("http://127.0.0.1:1".to_string());
  let result = client.get_block_count().await;
  assert!(matches!(result, Err(AppError::Client(_))));
}
