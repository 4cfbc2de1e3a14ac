use rust_decimal::Decimal;

use crate::analyzer::types::UnspentOutput;
use crate::types::AppError;

/// Flat fee attached to every transaction built by the wallet.
pub fn transaction_fee() -> Decimal {
    Decimal::new(1, 3)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoinSelection {
    pub selected: Vec<UnspentOutput>,
    pub total: Decimal,
    pub change: Decimal,
}

/// Takes outputs in the given order until they cover `value + fee`.
pub fn select_coins(unspent: &[UnspentOutput], value: Decimal, fee: Decimal) -> Result<CoinSelection, AppError> {
    let required = value + fee;
    let mut selected = Vec::new();
    let mut total = Decimal::ZERO;

    for output in unspent {
        total += output.amount;
        selected.push(output.clone());
        if total >= required {
            return Ok(CoinSelection {
                selected,
                total,
                change: total - required,
            });
        }
    }

    Err(AppError::InsufficientFunds {
        required,
        available: total,
    })
}
