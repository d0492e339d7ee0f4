//! Per-collection runtime context.

use std::fmt;
use std::sync::Mutex;

use cairn_types::generate_slug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::Span;

const UNKNOWN: &str = "unknown";

/// Who is acting, where, and under which tracing span.
///
/// A context is created once per collection and shared with every entity the
/// collection owns. Comments are stamped with its user and host, log events
/// are emitted inside its span, and default names come from its slug source.
pub struct Context {
    user: String,
    host: String,
    span: Span,
    rng: Mutex<StdRng>,
}

impl Context {
    /// Context for the current process, with user and host read from the
    /// environment. Either falls back to `"unknown"`.
    pub fn local() -> Self {
        Self::new(lookup_user(), lookup_host())
    }

    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            span: Span::none(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Attach the tracing span log events should be recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Make generated slugs reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// A fresh human-readable `adjective-adjective-noun` slug.
    pub fn slug(&self) -> String {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        generate_slug(&mut *rng)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::local()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("user", &self.user)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

fn lookup_user() -> String {
    env_first(&["USER", "USERNAME", "LOGNAME"]).unwrap_or_else(|| UNKNOWN.to_string())
}

fn lookup_host() -> String {
    env_first(&["HOSTNAME", "COMPUTERNAME"])
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()))
}
