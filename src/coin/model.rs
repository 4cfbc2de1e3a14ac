/**
* filename : model
* author : HAMA
* date: 2026. 10. 17.
* description: daemon-side JSON shapes (getblock, getrawtransaction, ...)
**/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ====== JSON-RPC envelope ======

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
  #[serde(default)]
  pub id: Value,
  #[serde(default)]
  pub result: Value,
  #[serde(default)]
  pub error: Value,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorPayload {
  pub code: i64,
  pub message: String,
}

// ====== Blocks ======

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBlock {
  pub hash: String,
  pub height: u64,
  #[serde(default)]
  pub size: u32,
  #[serde(default)]
  pub time: i64,
  /// -1 once the block has been reorganised out of the main chain.
  #[serde(default)]
  pub confirmations: i64,
  #[serde(default)]
  pub tx: Vec<String>,
  #[serde(default)]
  pub flags: Option<String>,
  #[serde(default)]
  pub mint: Option<Decimal>,
  #[serde(default)]
  pub difficulty: Option<f64>,
  #[serde(default)]
  pub previousblockhash: Option<String>,
  #[serde(default)]
  pub nextblockhash: Option<String>,
}

// ====== Transactions ======

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTransaction {
  pub txid: String,
  #[serde(default)]
  pub hex: Option<String>,
  #[serde(default)]
  pub size: Option<u32>,
  #[serde(default)]
  pub time: Option<i64>,
  #[serde(default)]
  pub blockhash: Option<String>,
  #[serde(default)]
  pub confirmations: Option<i64>,
  #[serde(default)]
  pub vin: Vec<RawVin>,
  #[serde(default)]
  pub vout: Vec<RawVout>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawVin {
  #[serde(default)]
  pub coinbase: Option<String>,
  #[serde(default)]
  pub txid: Option<String>,
  #[serde(default)]
  pub vout: Option<u32>,
  #[serde(default, rename = "scriptSig")]
  pub script_sig: Option<ScriptSig>,
  #[serde(default)]
  pub sequence: Option<u64>,
}

impl RawVin {
  pub fn is_coinbase(&self) -> bool {
    self.coinbase.is_some()
  }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptSig {
  #[serde(default)]
  pub asm: String,
  #[serde(default)]
  pub hex: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawVout {
  pub value: Decimal,
  pub n: u32,
  #[serde(rename = "scriptPubKey")]
  pub script_pub_key: ScriptPubKey,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScriptPubKey {
  #[serde(default)]
  pub asm: String,
  #[serde(default)]
  pub hex: String,
  #[serde(default, rename = "reqSigs")]
  pub req_sigs: Option<u32>,
  #[serde(default, rename = "type")]
  pub script_type: Option<String>,
  #[serde(default)]
  pub addresses: Option<Vec<String>>,
  // newer daemons report a single `address` instead of `addresses`
  #[serde(default)]
  pub address: Option<String>,
}

impl ScriptPubKey {
  /// The spendable address when the script pays exactly one address.
  pub fn single_address(&self) -> Option<String> {
    match &self.addresses {
      Some(addresses) if addresses.len() == 1 => Some(addresses[0].clone()),
      Some(_) => None,
      None => self.address.clone(),
    }
  }
}

// ====== Wallet RPC payloads ======

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutPoint {
  pub txid: String,
  pub vout: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrevOut {
  pub txid: String,
  pub vout: u32,
  #[serde(rename = "scriptPubKey")]
  pub script_pub_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignedTransaction {
  pub hex: String,
  #[serde(default)]
  pub complete: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainInfo {
  #[serde(default)]
  pub blocks: u64,
  #[serde(default)]
  pub difficulty: Value,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn multi_address_script_has_no_single_address() {
    let script: ScriptPubKey = serde_json::from_value(serde_json::json!({
      "hex": "5121",
      "type": "multisig",
      "addresses": ["PAaaaaaaaaaaaaaaaaaaaaaaaaaa", "PBbbbbbbbbbbbbbbbbbbbbbbbbbb"]
    }))
    .unwrap();
    assert_eq!(script.single_address(), None);

    let script: ScriptPubKey = serde_json::from_value(serde_json::json!({
      "hex": "76a9",
      "address": "PAaaaaaaaaaaaaaaaaaaaaaaaaaa"
    }))
    .unwrap();
    assert_eq!(script.single_address().as_deref(), Some("PAaaaaaaaaaaaaaaaaaaaaaaaaaa"));
  }

  #[test]
  fn coinbase_vin_parses_without_parent() {
    let vin: RawVin = serde_json::from_value(serde_json::json!({
      "coinbase": "03a0860100",
      "sequence": 4294967295u64
    }))
    .unwrap();
    assert!(vin.is_coinbase());
    assert!(vin.txid.is_none());
  }
}
