use std::fmt;
use std::str::FromStr;

/// Hive-backed dollars.
pub const NAI_HBD: i32 = 13;
/// Liquid HIVE.
pub const NAI_HIVE: i32 = 21;
/// Vesting shares (Hive Power).
pub const NAI_VESTS: i32 = 37;

/// Numeric asset identifier (NAI) as stored in `account_balance_history.nai`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetCode(pub i32);

impl AssetCode {
    pub fn nai(self) -> i32 {
        self.0
    }
}

impl fmt::Display for AssetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown asset code '{0}'")]
pub struct UnknownAsset(pub String);

impl FromStr for AssetCode {
    type Err = UnknownAsset;

    /// Accepts a bare NAI number (`21`), the `@@000000021` form, or a symbol (`HIVE`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let unknown = || UnknownAsset(trimmed.to_string());
        let symbol = trimmed.to_ascii_uppercase();
        match symbol.as_str() {
            "HBD" => return Ok(Self(NAI_HBD)),
            "HIVE" => return Ok(Self(NAI_HIVE)),
            "VESTS" => return Ok(Self(NAI_VESTS)),
            _ => {}
        }

        let digits = trimmed.strip_prefix("@@").unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unknown());
        }
        let value = digits.parse::<i32>().map_err(|_| unknown())?;
        Ok(Self(value))
    }
}
