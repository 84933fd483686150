use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Directory holding the built marketing pages.
#[derive(Debug, Clone)]
pub(crate) struct SiteAssets {
    root: PathBuf,
}

impl SiteAssets {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a request path onto a file below the site root.
    ///
    /// Returns `None` for anything that could escape the root.
    pub(crate) fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = request_path.trim_start_matches('/');
        let mut resolved = self.root.clone();

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                _ => return None,
            }
        }

        if relative.is_empty() || relative.ends_with('/') {
            resolved.push("index.html");
        }
        Some(resolved)
    }
}
