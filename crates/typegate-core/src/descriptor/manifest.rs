//! Manifest main-section parser (panic-free).
//!
//! Header names compare case-insensitively; values keep their bytes after the
//! `": "` separator, with continuation lines joined verbatim.

use crate::error::{Result, TypeGateError};

/// Longest header name the format allows.
const MAX_NAME_LEN: usize = 70;

/// Main-section attributes in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Value of `name`, matched case-insensitively. Later duplicates win.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    fn append_to_last(&mut self, more: &str) -> bool {
        match self.entries.last_mut() {
            Some((_, v)) => {
                v.push_str(more);
                true
            }
            None => false,
        }
    }
}

/// Parsed package descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: Attributes,
}

impl Manifest {
    /// Parse the main section of a manifest.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| TypeGateError::Descriptor(format!("manifest is not utf-8: {e}")))?;
        // A leading BOM is tolerated by most writers.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut main = Attributes::default();
        for (idx, line) in split_lines(text).enumerate() {
            if line.is_empty() {
                break;
            }
            if let Some(more) = line.strip_prefix(' ') {
                if !main.append_to_last(more) {
                    return Err(TypeGateError::Descriptor(format!(
                        "line {}: continuation without a header",
                        idx + 1
                    )));
                }
                continue;
            }
            let (name, value) = line.split_once(": ").ok_or_else(|| {
                TypeGateError::Descriptor(format!("line {}: expected `Name: value`", idx + 1))
            })?;
            validate_name(name, idx + 1)?;
            main.push(name.to_string(), value.to_string());
        }
        Ok(Self { main })
    }

    pub fn main_attributes(&self) -> &Attributes {
        &self.main
    }
}

/// Split on CRLF, LF or lone CR.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let s = rest?;
        if s.is_empty() {
            rest = None;
            return None;
        }
        match s.find(['\r', '\n']) {
            Some(pos) => {
                let skip = if s[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&s[pos + skip..]);
                Some(&s[..pos])
            }
            None => {
                rest = None;
                Some(s)
            }
        }
    })
}

fn validate_name(name: &str, line: usize) -> Result<()> {
    let ok = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(TypeGateError::Descriptor(format!(
            "line {line}: invalid header name `{name}`"
        )))
    }
}
