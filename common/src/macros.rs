//! Status-line macros.
//!
//! Thin wrappers over `tracing` so every crate reports progress through the
//! same targets. The terminal formatter picks its prefix symbol from the
//! level, and from the `edgeprobe::success` target for [`success!`].

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::tracing::info!(target: "edgeprobe::status", $($arg)*)
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::tracing::info!(target: "edgeprobe::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!(target: "edgeprobe::status", $($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::tracing::error!(target: "edgeprobe::status", $($arg)*)
    };
}
