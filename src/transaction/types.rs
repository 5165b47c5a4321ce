/// Transaction types for mockscan
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ExplorerError;

pub const ETHER_UNIT: &str = "ETH";
pub const GWEI_UNIT: &str = "Gwei";

/// Decimal places used when rendering address balances.
pub const BALANCE_DECIMALS: usize = 4;

/// An ether amount held as signed hundredths so sums stay exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ether(i64);

impl Ether {
    pub const ZERO: Ether = Ether(0);

    pub fn from_hundredths(hundredths: i64) -> Self {
        Ether(hundredths)
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }

    /// Renders the amount with `decimals` (at least 2) fractional digits and
    /// the unit label, e.g. `"3.0000 ETH"`.
    pub fn format_with(&self, decimals: usize) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let padding = "0".repeat(decimals.saturating_sub(2));
        format!("{}{}.{:02}{} {}", sign, abs / 100, abs % 100, padding, ETHER_UNIT)
    }

    pub fn to_balance_string(&self) -> String {
        self.format_with(BALANCE_DECIMALS)
    }
}

impl std::ops::Add for Ether {
    type Output = Ether;

    fn add(self, rhs: Ether) -> Ether {
        Ether(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Ether {
    type Output = Ether;

    fn sub(self, rhs: Ether) -> Ether {
        Ether(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Ether {
    fn add_assign(&mut self, rhs: Ether) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Ether {
    fn sub_assign(&mut self, rhs: Ether) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Ether {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.format_with(2))
    }
}

impl FromStr for Ether {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ExplorerError::InvalidInput(format!("Invalid ether amount: {:?}", s));

        let amount = s
            .trim()
            .strip_suffix(ETHER_UNIT)
            .map(str::trim_end)
            .ok_or_else(invalid)?;
        let (negative, digits) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty()
            || fraction.len() > 2
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let hundredths = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .ok_or_else(invalid)?;
        Ok(Ether(if negative { -hundredths } else { hundredths }))
    }
}

impl TryFrom<String> for Ether {
    type Error = ExplorerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ether> for String {
    fn from(value: Ether) -> Self {
        value.to_string()
    }
}

/// Gas price in whole Gwei.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gwei(pub u64);

impl fmt::Display for Gwei {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.0, GWEI_UNIT)
    }
}

impl FromStr for Gwei {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .strip_suffix(GWEI_UNIT)
            .and_then(|amount| amount.trim_end().parse().ok())
            .map(Gwei)
            .ok_or_else(|| ExplorerError::InvalidInput(format!("Invalid gas price: {:?}", s)))
    }
}

impl TryFrom<String> for Gwei {
    type Error = ExplorerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Gwei> for String {
    fn from(value: Gwei) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Failed,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TxStatus::Success => write!(f, "Success"),
            TxStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// A value transfer between two addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    /// `None` while the transaction is pending.
    pub block_id: Option<u64>,
    pub from: String,
    pub to: String,
    pub value: Ether,
    pub gas_price: Gwei,
    pub gas_used: u64,
    pub timestamp: u64,
    pub status: TxStatus,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.block_id.is_none()
    }

    /// Case-insensitive check against sender and recipient.
    pub fn involves(&self, address: &str) -> bool {
        self.from.eq_ignore_ascii_case(address) || self.to.eq_ignore_ascii_case(address)
    }

    /// Value change this transaction applies to `address`: credited when it
    /// is the recipient, debited when it is the sender. Gas is not charged.
    pub fn net_value_for(&self, address: &str) -> Ether {
        let mut delta = Ether::ZERO;
        if self.to.eq_ignore_ascii_case(address) {
            delta += self.value;
        }
        if self.from.eq_ignore_ascii_case(address) {
            delta -= self.value;
        }
        delta
    }
}
