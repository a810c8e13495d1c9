use super::raw;
use crate::{Error, MappingArray, Result, Value};

const NAME: &str = "Cache";

/// Second-level cache concurrency strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUsage {
    ReadOnly = 1,
    NonstrictReadWrite = 2,
    ReadWrite = 3,
}

/// Second-level cache configuration of a class or an association.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub usage: CacheUsage,
    pub region: Option<String>,
}

impl CacheUsage {
    fn from_value(value: &Value) -> Result<CacheUsage> {
        Ok(match value {
            Value::I64(1) => CacheUsage::ReadOnly,
            Value::I64(2) => CacheUsage::NonstrictReadWrite,
            Value::I64(3) => CacheUsage::ReadWrite,
            Value::String(s) if s.eq_ignore_ascii_case("READ_ONLY") => CacheUsage::ReadOnly,
            Value::String(s) if s.eq_ignore_ascii_case("NONSTRICT_READ_WRITE") => {
                CacheUsage::NonstrictReadWrite
            }
            Value::String(s) if s.eq_ignore_ascii_case("READ_WRITE") => CacheUsage::ReadWrite,
            _ => {
                return Err(Error::invalid_mapping(format!(
                    "invalid cache usage {value}"
                )))
            }
        })
    }
}

impl CacheConfig {
    pub fn new(usage: CacheUsage) -> CacheConfig {
        CacheConfig {
            usage,
            region: None,
        }
    }

    pub fn from_mapping_array(raw: &MappingArray) -> Result<CacheConfig> {
        let mut config = CacheConfig::new(CacheUsage::ReadOnly);

        for (key, value) in raw {
            match key.as_str() {
                "usage" => config.usage = CacheUsage::from_value(value)?,
                "region" => config.region = raw::opt_string(value, key, NAME)?,
                _ => return Err(Error::unknown_mapping_property(key.as_str(), NAME)),
            }
        }

        Ok(config)
    }

    pub(crate) fn from_value(value: &Value, owner: &str) -> Result<CacheConfig> {
        CacheConfig::from_mapping_array(raw::map(value, "cache", owner)?)
    }

    pub fn to_mapping_array(&self) -> MappingArray {
        let mut map = map! { "usage" => self.usage as i64 };
        if let Some(region) = &self.region {
            map.insert("region".into(), region.into());
        }
        map
    }
}
