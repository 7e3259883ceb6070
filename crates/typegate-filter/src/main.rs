//! typegate dry run
//!
//! Loads a filter config, activates the gate, then reads one JSON candidate per
//! stdin line and prints one JSON verdict per line:
//! - `{"name": "org.acme.Widget"}` checks the bare name
//! - `{"name": "...", "shape": "enum", "origin": "file:///..."}` checks a
//!   resolved type (`"remote": true` for types shipped over the channel)
//!
//! Decision counters are written to stderr on exit.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use typegate_core::types::{Provenance, TypeHandle, TypeShape};
use typegate_filter::{config, AdmissionGate};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Candidate {
    name: String,
    #[serde(default)]
    shape: Option<TypeShape>,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    remote: bool,
    #[serde(default)]
    supertypes: Vec<String>,
}

impl Candidate {
    fn is_resolved(&self) -> bool {
        self.shape.is_some() || self.origin.is_some() || self.remote || !self.supertypes.is_empty()
    }

    fn into_handle(self) -> Arc<TypeHandle> {
        let provenance = match (self.origin, self.remote) {
            (Some(o), _) => Provenance::Located(o.into()),
            (None, true) => Provenance::RemoteChannel,
            (None, false) => Provenance::Platform,
        };
        TypeHandle::new(self.name, provenance)
            .with_shape(self.shape.unwrap_or_default())
            .with_supertypes(self.supertypes)
            .into_shared()
    }
}

fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "typegate.yaml".into());
    let gate = match config::load_from_file(&path).and_then(|cfg| AdmissionGate::from_config(&cfg)) {
        Ok(g) => g,
        Err(e) => {
            tracing::error!(config = %path, error = %e, kind = e.kind().as_str(), "filter init failed");
            return ExitCode::FAILURE;
        }
    };
    gate.activate();

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let verdict = match serde_json::from_str::<Candidate>(&line) {
            Ok(p) if p.is_resolved() => {
                let name = p.name.clone();
                let ty = p.into_handle();
                json!({ "name": name, "path": "type", "admitted": gate.is_admitted(&ty) })
            }
            Ok(p) => {
                let admitted = gate.is_name_admitted(&p.name);
                json!({ "name": p.name, "path": "name", "admitted": admitted })
            }
            Err(e) => json!({ "error": format!("invalid candidate: {e}") }),
        };
        if writeln!(out, "{verdict}").is_err() {
            return ExitCode::FAILURE;
        }
    }

    eprint!("{}", gate.render_metrics());
    ExitCode::SUCCESS
}
