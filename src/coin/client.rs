/**
* author : HAMA
* date: 2026. 10. 17.
* description: JSON-RPC client for the coin daemon (single + batch calls)
**/

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::coin::coin_trait::ChainRpc;
use crate::coin::model::{ChainInfo, OutPoint, PrevOut, RawBlock, RawTransaction, RpcErrorPayload, RpcResponse, SignedTransaction};
use crate::types::AppError;

#[derive(Clone)]
pub struct RpcClient {
  client: Client,
  api_url: String,
  credentials: Option<(String, Option<String>)>,
  next_id: Arc<AtomicU64>,
}

impl RpcClient {
  pub fn new(api_url: String) -> Self {
    Self {
      client: Client::new(),
      api_url,
      credentials: None,
      next_id: Arc::new(AtomicU64::new(1)),
    }
  }

  pub fn with_credentials(mut self, user: String, password: Option<String>) -> Self {
    self.credentials = Some((user, password));
    self
  }

  /// Single call. A daemon-side error payload comes back as `Ok(None)`.
  pub async fn call(&self, method: &str, params: Value) -> Result<Option<Value>, AppError> {
    let payload = self.prepare_method(method, params);
    let body = self.send(&payload).await?;
    let response: RpcResponse = serde_json::from_value(body)?;
    Ok(extract_result(method, response))
  }

  /// Batch call. The result vector always has one slot per request, in request
  /// order; members that failed on the daemon side are `None`.
  pub async fn call_batch(&self, calls: &[(&str, Value)]) -> Result<Vec<Option<Value>>, AppError> {
    if calls.is_empty() {
      return Ok(Vec::new());
    }

    let mut ids = Vec::with_capacity(calls.len());
    let mut payloads = Vec::with_capacity(calls.len());
    for (method, params) in calls {
      let payload = self.prepare_method(method, params.clone());
      ids.push(payload["id"].as_u64().unwrap_or_default());
      payloads.push(payload);
    }

    let body = self.send(&Value::Array(payloads)).await?;
    let items = match body {
      Value::Array(items) => items,
      other => {
        return Err(AppError::Rpc(format!("batch response is not an array: {}", other)));
      }
    };

    let mut responses: HashMap<u64, RpcResponse> = HashMap::with_capacity(items.len());
    for item in items {
      match serde_json::from_value::<RpcResponse>(item) {
        Ok(response) => match response.id.as_u64() {
          Some(id) => {
            responses.insert(id, response);
          }
          None => warn!("[RpcClient] batch member without numeric id: {:?}", response.id),
        },
        Err(e) => warn!("[RpcClient] malformed batch member: {}", e),
      }
    }

    Ok(ids
      .iter()
      .zip(calls)
      .map(|(id, (method, _))| match responses.remove(id) {
        Some(response) => extract_result(method, response),
        None => {
          warn!("[RpcClient] no response for {} (id {})", method, id);
          None
        }
      })
      .collect())
  }

  async fn call_typed<T>(&self, method: &str, params: Value) -> Result<Option<T>, AppError>
  where
    T: DeserializeOwned + Send,
  {
    let result = self.call(method, params).await?;
    Ok(decode(method, result))
  }

  async fn batch_typed<T>(&self, method: &str, params: Vec<Value>) -> Result<Vec<T>, AppError>
  where
    T: DeserializeOwned + Send,
  {
    let calls: Vec<(&str, Value)> = params.into_iter().map(|p| (method, p)).collect();
    let results = self.call_batch(&calls).await?;
    Ok(results.into_iter().filter_map(|r| decode(method, r)).collect())
  }

  fn prepare_method(&self, method: &str, params: Value) -> Value {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    json!({
      "jsonrpc": "2.0",
      "id": id,
      "method": method,
      "params": params,
    })
  }

  async fn send(&self, payload: &Value) -> Result<Value, AppError> {
    let mut request = self
      .client
      .post(&self.api_url)
      .header("Content-Type", "application/json")
      .json(payload);
    if let Some((user, password)) = &self.credentials {
      request = request.basic_auth(user, password.as_deref());
    }

    // the daemon answers RPC errors with non-2xx codes but still a JSON body
    let response = request.send().await?.json::<Value>().await?;
    Ok(response)
  }
}

fn extract_result(method: &str, response: RpcResponse) -> Option<Value> {
  if !response.error.is_null() {
    match serde_json::from_value::<RpcErrorPayload>(response.error) {
      Ok(error) => warn!("[RpcClient] {} returned error {}: {}", method, error.code, error.message),
      Err(_) => warn!("[RpcClient] {} returned an unrecognised error payload", method),
    }
    return None;
  }
  if response.result.is_null() {
    debug!("[RpcClient] {} returned null result", method);
    return None;
  }
  Some(response.result)
}

fn decode<T: DeserializeOwned>(method: &str, value: Option<Value>) -> Option<T> {
  let value = value?;
  match serde_json::from_value(value) {
    Ok(decoded) => Some(decoded),
    Err(e) => {
      warn!("[RpcClient] cannot decode {} result: {}", method, e);
      None
    }
  }
}

fn amount_to_json(value: &Decimal) -> Result<Value, AppError> {
  value
    .normalize()
    .to_string()
    .parse::<serde_json::Number>()
    .map(Value::Number)
    .map_err(|e| AppError::Validation(format!("Invalid amount {}: {}", value, e)))
}

#[async_trait]
impl ChainRpc for RpcClient {
  async fn get_block_count(&self) -> Result<u64, AppError> {
    self
      .call_typed::<u64>("getblockcount", json!([]))
      .await?
      .ok_or_else(|| AppError::Rpc("getblockcount returned no result".to_string()))
  }

  async fn get_block_hash(&self, height: u64) -> Result<Option<String>, AppError> {
    self.call_typed("getblockhash", json!([height])).await
  }

  async fn get_best_block_hash(&self) -> Result<Option<String>, AppError> {
    self.call_typed("getbestblockhash", json!([])).await
  }

  async fn get_block(&self, hash: &str) -> Result<Option<RawBlock>, AppError> {
    self.call_typed("getblock", json!([hash])).await
  }

  async fn get_block_hashes(&self, heights: &[u64]) -> Result<Vec<String>, AppError> {
    let params = heights.iter().map(|height| json!([height])).collect();
    self.batch_typed("getblockhash", params).await
  }

  async fn get_blocks(&self, hashes: &[String]) -> Result<Vec<RawBlock>, AppError> {
    let params = hashes.iter().map(|hash| json!([hash])).collect();
    self.batch_typed("getblock", params).await
  }

  async fn get_raw_mempool(&self) -> Result<Vec<String>, AppError> {
    Ok(self
      .call_typed::<Vec<String>>("getrawmempool", json!([false]))
      .await?
      .unwrap_or_default())
  }

  async fn get_raw_transaction(&self, txid: &str) -> Result<Option<RawTransaction>, AppError> {
    self.call_typed("getrawtransaction", json!([txid, 1])).await
  }

  async fn get_raw_transactions(&self, txids: &[String]) -> Result<Vec<RawTransaction>, AppError> {
    let params = txids.iter().map(|txid| json!([txid, 1])).collect();
    self.batch_typed("getrawtransaction", params).await
  }

  async fn create_raw_transaction(
    &self,
    inputs: &[OutPoint],
    outputs: &[(String, Decimal)],
  ) -> Result<Option<String>, AppError> {
    let mut destinations = Map::new();
    for (address, value) in outputs {
      destinations.insert(address.clone(), amount_to_json(value)?);
    }
    self
      .call_typed("createrawtransaction", json!([inputs, destinations]))
      .await
  }

  async fn sign_raw_transaction(
    &self,
    hex: &str,
    prevouts: &[PrevOut],
    private_keys: &[String],
  ) -> Result<Option<SignedTransaction>, AppError> {
    self
      .call_typed("signrawtransaction", json!([hex, prevouts, private_keys]))
      .await
  }

  async fn send_raw_transaction(&self, hex: &str) -> Result<Option<String>, AppError> {
    self.call_typed("sendrawtransaction", json!([hex])).await
  }

  async fn get_info(&self) -> Result<Option<ChainInfo>, AppError> {
    self.call_typed("getinfo", json!([])).await
  }

  async fn get_network_hashps(&self) -> Result<Option<f64>, AppError> {
    self.call_typed("getnetworkhashps", json!([])).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn amounts_are_sent_as_plain_json_numbers() {
    let value = Decimal::from_str("1.50000000").unwrap();
    assert_eq!(amount_to_json(&value).unwrap().to_string(), "1.5");
  }

  #[test]
  fn request_ids_are_sequential() {
    let client = RpcClient::new("http://127.0.0.1:1".to_string());
    let first = client.prepare_method("getblockcount", json!([]));
    let second = client.prepare_method("getblockcount", json!([]));
    assert_eq!(second["id"].as_u64().unwrap(), first["id"].as_u64().unwrap() + 1);
  }

  #[test]
  fn error_payloads_yield_no_result() {
    let coded: RpcResponse = serde_json::from_value(json!({
      "id": 1,
      "result": null,
      "error": { "code": -5, "message": "No such mempool or blockchain transaction" }
    }))
    .unwrap();
    assert_eq!(extract_result("getrawtransaction", coded), None);

    let bare: RpcResponse = serde_json::from_value(json!({ "id": 2, "result": 7, "error": "boom" })).unwrap();
    assert_eq!(extract_result("getblockcount", bare), None);

    let ok: RpcResponse = serde_json::from_value(json!({ "id": 3, "result": 7, "error": null })).unwrap();
    assert_eq!(extract_result("getblockcount", ok), Some(json!(7)));
  }
}
