use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An indexed transaction. `block_number` decides which level of the
/// repository owns it: `None` lives in the mempool, `Some` in the confirmed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub block_number: Option<u64>,
    pub block_hash: Option<String>,
    pub time: i64,
    pub size: u32,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

/// A spent reference to a parent output. `address` and `value` are copied
/// from the parent output when the transaction is normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub tx_id: String,
    pub parent_tx_id: String,
    pub vout: u32,
    pub address: Option<String>,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub tx_id: String,
    pub address: Option<String>,
    pub value: Decimal,
    pub vout: u32,
}

impl Transaction {
    pub fn is_confirmed(&self) -> bool {
        self.block_number.is_some()
    }

    pub fn output(&self, vout: u32) -> Option<&Output> {
        self.outputs.iter().find(|o| o.vout == vout)
    }

    /// True when any input or output belongs to `address`.
    pub fn touches(&self, address: &str) -> bool {
        self.inputs.iter().any(|i| i.address.as_deref() == Some(address))
            || self.outputs.iter().any(|o| o.address.as_deref() == Some(address))
    }

    pub fn inputs_value(&self) -> Decimal {
        self.inputs.iter().map(|i| i.value).sum()
    }

    pub fn outputs_value(&self) -> Decimal {
        self.outputs.iter().map(|o| o.value).sum()
    }
}
