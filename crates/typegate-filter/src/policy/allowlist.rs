//! Allow-list store: exact names of third-party types that are trusted even
//! though they come from an untrusted origin.
//!
//! Loaded once at startup. A missing or corrupt list is an init failure; the
//! filter never starts with a partial list.

use std::collections::HashSet;
use std::fs;

use typegate_core::error::{Result, TypeGateError};

use crate::config::AllowListSection;

/// Newline-delimited list shipped with the crate.
pub const EMBEDDED_ALLOWLIST: &str = include_str!("../../data/allowed-types.txt");

#[derive(Debug, Clone, Default)]
pub struct AllowList {
    names: HashSet<String>,
}

impl AllowList {
    /// Parse newline-delimited names. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut names = HashSet::new();
        for (idx, line) in text.lines().enumerate() {
            let name = line.trim();
            if name.is_empty() || name.starts_with('#') {
                continue;
            }
            check_entry(name).map_err(|why| {
                TypeGateError::Init(format!("allow-list line {}: {why}: {name:?}", idx + 1))
            })?;
            names.insert(name.to_string());
        }
        Ok(Self { names })
    }

    /// Load the configured file (or the embedded list) plus inline extras.
    pub fn load(section: &AllowListSection) -> Result<Self> {
        let mut list = match &section.path {
            Some(path) => {
                let raw = fs::read(path).map_err(|e| {
                    TypeGateError::Init(format!("read allow-list {path} failed: {e}"))
                })?;
                let text = String::from_utf8(raw).map_err(|e| {
                    TypeGateError::Init(format!("allow-list {path} is not utf-8: {e}"))
                })?;
                Self::parse(&text)?
            }
            None => Self::parse(EMBEDDED_ALLOWLIST)?,
        };

        for name in &section.extra {
            check_entry(name).map_err(|why| {
                TypeGateError::Init(format!("allowlist.extra: {why}: {name:?}"))
            })?;
            list.names.insert(name.clone());
        }
        Ok(list)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn check_entry(name: &str) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty entry");
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("whitespace inside type name");
    }
    Ok(())
}
