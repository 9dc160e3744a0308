//! Logging handle injected into every lookup.
//!
//! Lookups never talk to a process-wide logger by name; callers hand them a
//! [`LogSink`] at construction time. The default [`LogFacadeSink`] forwards to
//! the `log` facade, so whichever backend the binary installed receives the
//! records.

use log::Level;

/// Destination for the discrete log records produced by lookups and reporters.
///
/// Implementations must accept calls from several tasks at once and write each
/// record atomically. They must not block for long: a stalled sink stalls probing.
pub trait LogSink: Send + Sync {
    /// Emit one record.
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// [`LogSink`] backed by the `log` facade under a fixed target.
#[derive(Debug, Clone, Copy)]
pub struct LogFacadeSink {
    target: &'static str,
}

impl LogFacadeSink {
    /// Target used by the CDN detector.
    pub const CDN: Self = Self::new("runwar::cdn");
    /// Target used by the IP lookup.
    pub const IP: Self = Self::new("runwar::ip");
    /// Target used by the ICP lookup.
    pub const ICP: Self = Self::new("runwar::icp");
    /// Target used by the WHOIS lookup.
    pub const WHOIS: Self = Self::new("runwar::whois");

    pub const fn new(target: &'static str) -> Self {
        Self { target }
    }

    pub const fn target(&self) -> &'static str {
        self.target
    }
}

impl LogSink for LogFacadeSink {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: self.target, level, "{message}");
    }
}
