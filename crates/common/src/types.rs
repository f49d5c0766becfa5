use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ValidationError;

/// How raw textual input for a config entry is parsed before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Decimal,
    Integer,
    Float,
    Bool,
}

impl TypeTag {
    /// Decode raw input into a typed value. Surrounding whitespace is ignored.
    pub fn parse(self, raw: &str) -> Result<ConfigValue, ValidationError> {
        let trimmed = raw.trim();
        let mismatch = || ValidationError::Parse {
            expected: self,
            raw: raw.to_string(),
        };

        match self {
            TypeTag::String => Ok(ConfigValue::String(trimmed.to_string())),
            TypeTag::Decimal => Decimal::from_str(trimmed)
                .map(ConfigValue::Decimal)
                .map_err(|_| mismatch()),
            TypeTag::Integer => trimmed
                .parse::<i64>()
                .map(ConfigValue::Integer)
                .map_err(|_| mismatch()),
            TypeTag::Float => match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(ConfigValue::Float(v)),
                _ => Err(mismatch()),
            },
            TypeTag::Bool => match trimmed.to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(ConfigValue::Bool(true)),
                "false" | "no" | "n" | "0" => Ok(ConfigValue::Bool(false)),
                _ => Err(mismatch()),
            },
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::String => write!(f, "string"),
            TypeTag::Decimal => write!(f, "decimal"),
            TypeTag::Integer => write!(f, "integer"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Bool => write!(f, "bool"),
        }
    }
}

/// A resolved config value. The variant always agrees with the entry's
/// [`TypeTag`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Decimal(Decimal),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl ConfigValue {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            ConfigValue::String(_) => TypeTag::String,
            ConfigValue::Decimal(_) => TypeTag::Decimal,
            ConfigValue::Integer(_) => TypeTag::Integer,
            ConfigValue::Float(_) => TypeTag::Float,
            ConfigValue::Bool(_) => TypeTag::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            ConfigValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{s}"),
            ConfigValue::Decimal(d) => write!(f, "{d}"),
            ConfigValue::Integer(i) => write!(f, "{i}"),
            ConfigValue::Float(v) => write!(f, "{v}"),
            ConfigValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<Decimal> for ConfigValue {
    fn from(d: Decimal) -> Self {
        ConfigValue::Decimal(d)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

/// Split a `BASE-QUOTE` trading pair into its two assets.
pub fn split_trading_pair(pair: &str) -> Option<(&str, &str)> {
    let (base, quote) = pair.split_once('-')?;
    if base.is_empty() || quote.is_empty() || quote.contains('-') {
        return None;
    }
    Some((base, quote))
}
