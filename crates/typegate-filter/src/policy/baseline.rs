//! Baseline denylist: the first-pass authority on known gadget names.
//!
//! The engine only sees the [`BaselineDecision`] trait; [`PatternDenylist`]
//! is the regex-backed implementation built from configuration.

use regex::Regex;
use typegate_core::error::{Result, TypeGateError};

/// Known gadget families. Matched against fully-qualified names.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"^bsh[.].*",
    r"^com[.]google[.]inject[.].*",
    r"^com[.]mchange[.]v2[.]c3p0[.].*",
    r"^com[.]sun[.]jndi[.].*",
    r"^com[.]sun[.]corba[.].*",
    r"^com[.]sun[.]javafx[.].*",
    r"^com[.]sun[.]org[.]apache[.]regex[.]internal[.].*",
    r"^java[.]awt[.].*",
    r"^java[.]lang[.]reflect[.]Method$",
    r"^java[.]net[.]URLClassLoader$",
    r"^java[.]rmi[.].*",
    r"^java[.]security[.]SignedObject$",
    r"^java[.]util[.]ServiceLoader$",
    r"^javax[.]imageio[.].*",
    r"^javax[.]management[.].*",
    r"^javax[.]naming[.].*",
    r"^javax[.]script[.].*",
    r"^javax[.]swing[.].*",
    r"^net[.]sf[.]json[.].*",
    r"^org[.]apache[.]commons[.]beanutils[.].*",
    r"^org[.]apache[.]commons[.]collections[.]functors[.].*",
    r"^org[.]apache[.]myfaces[.].*",
    r"^org[.]apache[.]wicket[.].*",
    r".*org[.]apache[.]xalan.*",
    r"^org[.]codehaus[.]groovy[.]runtime[.].*",
    r"^org[.]hibernate[.].*",
    r"^org[.]python[.].*",
    r"^sun[.]rmi[.].*",
];

/// Opaque permit/deny oracle over fully-qualified type names.
pub trait BaselineDecision: Send + Sync {
    fn deny(&self, name: &str) -> bool;
}

/// Ordered regex denylist.
#[derive(Debug, Clone)]
pub struct PatternDenylist {
    patterns: Vec<Regex>,
}

impl PatternDenylist {
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(raw.len());
        for p in raw {
            let p = p.as_ref();
            let re = Regex::new(p).map_err(|e| {
                TypeGateError::Init(format!("invalid baseline pattern {p:?}: {e}"))
            })?;
            patterns.push(re);
        }
        Ok(Self { patterns })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_PATTERNS)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl BaselineDecision for PatternDenylist {
    fn deny(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }
}
