//! Filter config loader (strict parsing).

pub mod schema;

use std::fs;

use typegate_core::error::{Result, TypeGateError};

pub use schema::{
    AllowListSection, BaselineSection, DescriptorSection, FilterConfig, FilterSection,
    OriginsSection, PolicyConfig,
};

pub fn load_from_file(path: &str) -> Result<FilterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TypeGateError::Init(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<FilterConfig> {
    let cfg: FilterConfig = serde_yaml::from_str(s)
        .map_err(|e| TypeGateError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
