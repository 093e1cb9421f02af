//! Existence probing: does `{base}/{n}.{ext}` exist?
//!
//! Probes never fail. Transport errors, non-2xx statuses and missing files
//! all answer `false`; the discovery loop counts them the same way.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::resource::{Base, ResourceId};

/// Answers whether a resource exists, without fetching its body.
///
/// Implementations are called concurrently from scoped threads within a
/// discovery batch, hence `Sync`.
pub trait Prober: Sync {
    fn probe(&self, id: &ResourceId) -> bool;
}

/// Metadata check against a local directory.
pub struct FsProber {
    dir: PathBuf,
}

impl FsProber {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Prober for FsProber {
    fn probe(&self, id: &ResourceId) -> bool {
        let path = self.dir.join(id.name());
        match std::fs::metadata(&path) {
            Ok(meta) => meta.is_file(),
            Err(e) => {
                debug!("probe: {} -> {e}", path.display());
                false
            }
        }
    }
}

/// `HEAD` request against a URL prefix.
pub struct HttpProber {
    prefix: String,
    agent: ureq::Agent,
}

impl HttpProber {
    pub fn new(prefix: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, id: &ResourceId) -> String {
        format!("{}/{}", self.prefix, id.name())
    }
}

impl Prober for HttpProber {
    fn probe(&self, id: &ResourceId) -> bool {
        let url = self.url(id);
        match self.agent.head(&url).call() {
            Ok(resp) => {
                let ok = resp.status().is_success();
                debug!("probe: HEAD {url} -> {}", resp.status());
                ok
            }
            Err(e) => {
                debug!("probe: HEAD {url} -> {e}");
                false
            }
        }
    }
}

/// Pick the probing strategy matching the base location.
pub fn for_base(base: &Base, timeout: Duration) -> Box<dyn Prober + Send> {
    match base {
        Base::Dir(dir) => Box::new(FsProber::new(dir.clone())),
        Base::Url(prefix) => Box::new(HttpProber::new(prefix, timeout)),
    }
}
