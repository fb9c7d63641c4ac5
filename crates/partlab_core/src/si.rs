use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{CatalogError, CatalogResult};

/// SI scaling prefixes accepted on numeric attribute values, Peta (10^15)
/// down to femto (10^-15). `Base` is the unscaled unit, factor 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SiPrefix {
    Peta,
    Tera,
    Giga,
    Mega,
    Kilo,
    Base,
    Milli,
    Micro,
    Nano,
    Pico,
    Femto,
}

impl SiPrefix {
    pub const ALL: [SiPrefix; 11] = [
        SiPrefix::Peta,
        SiPrefix::Tera,
        SiPrefix::Giga,
        SiPrefix::Mega,
        SiPrefix::Kilo,
        SiPrefix::Base,
        SiPrefix::Milli,
        SiPrefix::Micro,
        SiPrefix::Nano,
        SiPrefix::Pico,
        SiPrefix::Femto,
    ];

    pub fn exponent(self) -> i32 {
        match self {
            SiPrefix::Peta => 15,
            SiPrefix::Tera => 12,
            SiPrefix::Giga => 9,
            SiPrefix::Mega => 6,
            SiPrefix::Kilo => 3,
            SiPrefix::Base => 0,
            SiPrefix::Milli => -3,
            SiPrefix::Micro => -6,
            SiPrefix::Nano => -9,
            SiPrefix::Pico => -12,
            SiPrefix::Femto => -15,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            SiPrefix::Peta => "P",
            SiPrefix::Tera => "T",
            SiPrefix::Giga => "G",
            SiPrefix::Mega => "M",
            SiPrefix::Kilo => "k",
            SiPrefix::Base => "",
            SiPrefix::Milli => "m",
            SiPrefix::Micro => "µ",
            SiPrefix::Nano => "n",
            SiPrefix::Pico => "p",
            SiPrefix::Femto => "f",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "P" => Some(SiPrefix::Peta),
            "T" => Some(SiPrefix::Tera),
            "G" => Some(SiPrefix::Giga),
            "M" => Some(SiPrefix::Mega),
            "k" => Some(SiPrefix::Kilo),
            "" => Some(SiPrefix::Base),
            "m" => Some(SiPrefix::Milli),
            // Accept the ASCII fallback spelling alongside the micro sign.
            "µ" | "u" => Some(SiPrefix::Micro),
            "n" => Some(SiPrefix::Nano),
            "p" => Some(SiPrefix::Pico),
            "f" => Some(SiPrefix::Femto),
            _ => None,
        }
    }

    /// Parse a stored prefix symbol. Historical rows may carry a symbol that
    /// is no longer recognized or allowed; those degrade to the base factor
    /// instead of failing the read.
    pub fn from_symbol_lossy(symbol: &str) -> Self {
        Self::from_symbol(symbol).unwrap_or(SiPrefix::Base)
    }

    fn power_of_ten(self) -> Decimal {
        Decimal::from(10i64.pow(self.exponent().unsigned_abs()))
    }
}

impl Default for SiPrefix {
    fn default() -> Self {
        SiPrefix::Base
    }
}

impl Serialize for SiPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for SiPrefix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        SiPrefix::from_symbol(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown SI prefix '{value}'")))
    }
}

/// Convert a user-facing display value into the canonical base-unit value.
pub fn normalize(display: Decimal, prefix: SiPrefix) -> CatalogResult<Decimal> {
    let scaled = if prefix.exponent() >= 0 {
        display.checked_mul(prefix.power_of_ten())
    } else {
        display.checked_div(prefix.power_of_ten())
    };
    scaled.ok_or_else(|| {
        CatalogError::invalid(format!(
            "value {display} out of range for prefix '{}'",
            prefix.symbol()
        ))
    })
}

/// Convert a canonical base-unit value back into the display value for the
/// given prefix.
pub fn denormalize(normalized: Decimal, prefix: SiPrefix) -> CatalogResult<Decimal> {
    let scaled = if prefix.exponent() >= 0 {
        normalized.checked_div(prefix.power_of_ten())
    } else {
        normalized.checked_mul(prefix.power_of_ten())
    };
    scaled.ok_or_else(|| {
        CatalogError::invalid(format!(
            "value {normalized} out of range for prefix '{}'",
            prefix.symbol()
        ))
    })
}

/// Render a canonical value for presentation: display value rounded to
/// `decimals` places, followed by the prefix symbol and the unit symbol,
/// e.g. `4.70kΩ`.
pub fn format_quantity(
    normalized: Decimal,
    prefix: SiPrefix,
    decimals: u32,
    unit: Option<&str>,
) -> CatalogResult<String> {
    let display = denormalize(normalized, prefix)?.round_dp(decimals);
    Ok(format!(
        "{display:.prec$}{}{}",
        prefix.symbol(),
        unit.unwrap_or(""),
        prec = decimals as usize,
    ))
}
