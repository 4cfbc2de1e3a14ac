use rust_decimal::Decimal;
use serde::Serialize;

use crate::analyzer::utils::block_type;
use crate::coin::model::RawBlock;
use crate::respository::Transaction;

/// 주소 기준으로 렌더링된 출력 (부호 포함)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputModel {
    pub address: Option<String>,
    pub value: Decimal,
}

impl OutputModel {
    pub fn new(address: Option<String>, value: Decimal) -> Self {
        Self { address, value }
    }
}

/// One row of an address history.
///
/// Confirmations are only written through `set_confirmations`: a negative
/// value is stored as 0 and marks the transaction as double spent.
#[derive(Debug, Clone, Serialize)]
pub struct AddressTransactionModel {
    pub txid: String,
    pub time: i64,
    pub size: u32,
    confirmations: i64,
    double_spend: bool,
    #[serde(skip)]
    pub block_hash: Option<String>,
    pub inputs: Vec<Option<String>>,
    pub outputs: Vec<OutputModel>,
    pub outputs_value: Decimal,
}

impl AddressTransactionModel {
    /// `block_count` is the current chain tip height.
    pub fn new(tx: &Transaction, block_count: u64) -> Self {
        let mut model = Self {
            txid: tx.id.clone(),
            time: tx.time,
            size: tx.size,
            confirmations: 0,
            double_spend: false,
            block_hash: tx.block_hash.clone(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            outputs_value: Decimal::ZERO,
        };
        if let Some(block_number) = tx.block_number {
            model.set_confirmations(block_count as i64 - block_number as i64 + 1);
        }
        model
    }

    pub fn confirmations(&self) -> i64 {
        self.confirmations
    }

    pub fn double_spend(&self) -> bool {
        self.double_spend
    }

    pub fn set_confirmations(&mut self, value: i64) {
        if value < 0 {
            self.confirmations = 0;
            self.double_spend = true;
        } else {
            self.confirmations = value;
        }
    }

    /// Inputs render as a set of addresses.
    pub(crate) fn push_input(&mut self, address: Option<String>) {
        if !self.inputs.contains(&address) {
            self.inputs.push(address);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnspentOutput {
    pub txid: String,
    pub vout: u32,
    pub address: String,
    pub amount: Decimal,
    pub script_pub_key: Option<String>,
}

/// Balance and history of one address.
#[derive(Debug, Clone, Serialize)]
pub struct AddressModel {
    pub address: String,
    pub total_received: Decimal,
    pub total_sent: Decimal,
    pub transactions: Vec<AddressTransactionModel>,
    pub unspent_outputs: Vec<UnspentOutput>,
}

impl AddressModel {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            total_received: Decimal::ZERO,
            total_sent: Decimal::ZERO,
            transactions: Vec::new(),
            unspent_outputs: Vec::new(),
        }
    }

    pub fn total_balance(&self) -> Decimal {
        self.total_received - self.total_sent
    }
}

/// Full view of a single transaction, also used as the new-transaction event payload.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionModel {
    pub txid: String,
    pub time: i64,
    pub size: u32,
    confirmations: i64,
    double_spend: bool,
    pub block_number: Option<u64>,
    pub inputs: Vec<Option<String>>,
    pub outputs: Vec<OutputModel>,
    pub inputs_value: Decimal,
    pub outputs_value: Decimal,
}

impl TransactionModel {
    pub fn confirmations(&self) -> i64 {
        self.confirmations
    }

    pub fn double_spend(&self) -> bool {
        self.double_spend
    }

    pub fn set_confirmations(&mut self, value: i64) {
        if value < 0 {
            self.confirmations = 0;
            self.double_spend = true;
        } else {
            self.confirmations = value;
        }
    }

    pub fn with_confirmations(mut self, value: i64) -> Self {
        self.set_confirmations(value);
        self
    }
}

impl From<&Transaction> for TransactionModel {
    fn from(tx: &Transaction) -> Self {
        let mut inputs: Vec<Option<String>> = Vec::new();
        for input in &tx.inputs {
            if !inputs.contains(&input.address) {
                inputs.push(input.address.clone());
            }
        }
        Self {
            txid: tx.id.clone(),
            time: tx.time,
            size: tx.size,
            confirmations: 0,
            double_spend: false,
            block_number: tx.block_number,
            inputs,
            outputs: tx
                .outputs
                .iter()
                .map(|o| OutputModel::new(o.address.clone(), o.value))
                .collect(),
            inputs_value: tx.inputs_value(),
            outputs_value: tx.outputs_value(),
        }
    }
}

/// Row of the "latest transactions" list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionItemModel {
    pub txid: String,
    pub time: i64,
    pub size: u32,
    pub outputs_value: Decimal,
}

impl From<&Transaction> for TransactionItemModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            txid: tx.id.clone(),
            time: tx.time,
            size: tx.size,
            outputs_value: tx.outputs_value(),
        }
    }
}

/// Block summary (new-block event payload and block listings).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockItemModel {
    pub hash: String,
    pub size: u32,
    pub height: u64,
    pub time: i64,
    pub mint: Decimal,
    #[serde(rename = "type")]
    pub block_type: String,
    pub tx_count: usize,
    pub coins_sent: Decimal,
}

impl BlockItemModel {
    pub fn new(block: &RawBlock, transactions: &[TransactionModel]) -> Self {
        Self {
            hash: block.hash.clone(),
            size: block.size,
            height: block.height,
            time: block.time,
            mint: block.mint.unwrap_or_default(),
            block_type: block_type(block.flags.as_deref()).to_string(),
            tx_count: transactions.len(),
            coins_sent: transactions.iter().map(|tx| tx.outputs_value).sum(),
        }
    }
}
