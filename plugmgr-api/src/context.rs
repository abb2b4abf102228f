//! PluginContext - host capabilities handed to every lifecycle hook

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

/// Severity of a message a plugin logs through its context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Receives `(level, plugin, message)` for every message a plugin logs.
///
/// A native plugin carries its own copy of this crate and of `tracing`, so
/// its log calls go through the sink, whose code belongs to the host.
pub type LogSink = Arc<dyn Fn(LogLevel, &str, &str) + Send + Sync>;

/// Handle to the host process, passed to every lifecycle hook.
///
/// Constructed once per process and cloned freely; clones share the same
/// underlying state. Log helpers forward to the host's [`LogSink`], which
/// defaults to the host's `tracing` subscriber.
#[derive(Clone)]
pub struct PluginContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    host_name: String,
    instance_id: Uuid,
    data_dir: PathBuf,
    log_sink: LogSink,
}

fn tracing_sink(host_name: String) -> LogSink {
    Arc::new(move |level: LogLevel, plugin: &str, message: &str| match level {
        LogLevel::Debug => tracing::debug!(host = %host_name, plugin = %plugin, "{}", message),
        LogLevel::Info => tracing::info!(host = %host_name, plugin = %plugin, "{}", message),
        LogLevel::Warn => tracing::warn!(host = %host_name, plugin = %plugin, "{}", message),
        LogLevel::Error => tracing::error!(host = %host_name, plugin = %plugin, "{}", message),
    })
}

impl PluginContext {
    /// Create a new context for a host
    pub fn new(host_name: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        let host_name = host_name.into();
        Self {
            inner: Arc::new(ContextInner {
                log_sink: tracing_sink(host_name.clone()),
                host_name,
                instance_id: Uuid::new_v4(),
                data_dir: data_dir.into(),
            }),
        }
    }

    /// Replace the log sink. Returns a new context: existing clones keep the
    /// old sink and no longer compare equal with [`same_as`](Self::same_as).
    pub fn with_log_sink(self, log_sink: LogSink) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                host_name: self.inner.host_name.clone(),
                instance_id: self.inner.instance_id,
                data_dir: self.inner.data_dir.clone(),
                log_sink,
            }),
        }
    }

    /// Name of the host process
    pub fn host_name(&self) -> &str {
        &self.inner.host_name
    }

    /// Unique id of this host process run
    pub fn instance_id(&self) -> Uuid {
        self.inner.instance_id
    }

    /// Root directory for plugin data
    pub fn data_dir(&self) -> &Path {
        &self.inner.data_dir
    }

    /// Directory a plugin may use for its own files
    pub fn plugin_data_dir(&self, plugin_name: &str) -> PathBuf {
        self.inner.data_dir.join(plugin_name)
    }

    /// Whether two handles refer to the same context
    pub fn same_as(&self, other: &PluginContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ─── Logging ─────────────────────────────────────────────────────

    /// Log a message on behalf of a plugin
    pub fn log(&self, level: LogLevel, plugin: &str, message: &str) {
        (self.inner.log_sink)(level, plugin, message);
    }

    pub fn log_info(&self, plugin: &str, message: &str) {
        self.log(LogLevel::Info, plugin, message);
    }

    pub fn log_warn(&self, plugin: &str, message: &str) {
        self.log(LogLevel::Warn, plugin, message);
    }

    pub fn log_error(&self, plugin: &str, message: &str) {
        self.log(LogLevel::Error, plugin, message);
    }

    pub fn log_debug(&self, plugin: &str, message: &str) {
        self.log(LogLevel::Debug, plugin, message);
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("host_name", &self.inner.host_name)
            .field("instance_id", &self.inner.instance_id)
            .field("data_dir", &self.inner.data_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = PluginContext::new("host", "/tmp/plugmgr");
        assert_eq!(ctx.host_name(), "host");
        assert_eq!(ctx.data_dir(), Path::new("/tmp/plugmgr"));
        assert_eq!(
            ctx.plugin_data_dir("greeter"),
            PathBuf::from("/tmp/plugmgr/greeter")
        );
    }

    #[test]
    fn test_clones_share_identity() {
        let ctx = PluginContext::new("host", "/tmp/plugmgr");
        let clone = ctx.clone();
        assert!(ctx.same_as(&clone));
        assert_eq!(ctx.instance_id(), clone.instance_id());

        let other = PluginContext::new("host", "/tmp/plugmgr");
        assert!(!ctx.same_as(&other));
        assert_ne!(ctx.instance_id(), other.instance_id());
    }

    #[test]
    fn test_log_helpers_go_through_sink() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_in_sink = seen.clone();
        let ctx = PluginContext::new("host", "/tmp/plugmgr").with_log_sink(Arc::new(
            move |level: LogLevel, plugin: &str, message: &str| {
                seen_in_sink
                    .lock()
                    .unwrap()
                    .push((level, plugin.to_string(), message.to_string()));
            },
        ));

        ctx.log_info("greeter", "hello");
        ctx.clone().log_error("greeter", "oops");

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (LogLevel::Info, "greeter".to_string(), "hello".to_string()),
                (LogLevel::Error, "greeter".to_string(), "oops".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_log_sink_keeps_host_details() {
        let ctx = PluginContext::new("host", "/tmp/plugmgr");
        let id = ctx.instance_id();
        let replaced = ctx.with_log_sink(Arc::new(|_: LogLevel, _: &str, _: &str| {}));

        assert_eq!(replaced.host_name(), "host");
        assert_eq!(replaced.instance_id(), id);
        replaced.log_warn("greeter", "dropped");
    }
}
