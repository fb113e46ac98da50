//! The logging-sink collaborator (spec.md §6): a level-checked write side
//! for the diagnostics the core emits (const-qualifier drops, type-spec
//! warnings, pre-destruction callback failures).

use log::Level;

/// A write-only diagnostic sink. Implementations must be cheap to probe
/// with [`LoggingSink::enabled`] so the core can skip formatting a message
/// nobody will see.
pub trait LoggingSink: Send + Sync {
    fn enabled(&self, level: Level) -> bool;

    fn log(&self, level: Level, message: &str);
}

/// The default sink: forwards to the `log` crate's global logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalLogSink;

impl LoggingSink for GlobalLogSink {
    fn enabled(&self, level: Level) -> bool {
        log::log_enabled!(target: "inject", level)
    }

    fn log(&self, level: Level, message: &str) {
        log::log!(target: "inject", level, "{message}");
    }
}

/// Formats and writes `message` through `sink` only if `level` is enabled,
/// matching the "test enabled before formatting" contract of spec.md §6.
pub fn log_if_enabled(sink: &dyn LoggingSink, level: Level, message: impl FnOnce() -> String) {
    if sink.enabled(level) {
        sink.log(level, &message());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
    }

    impl LoggingSink for RecordingSink {
        fn enabled(&self, _level: Level) -> bool {
            true
        }

        fn log(&self, _level: Level, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn log_if_enabled_skips_formatting_when_disabled() {
        struct DisabledSink;
        impl LoggingSink for DisabledSink {
            fn enabled(&self, _level: Level) -> bool {
                false
            }
            fn log(&self, _level: Level, _message: &str) {
                panic!("should not be called");
            }
        }

        log_if_enabled(&DisabledSink, Level::Warn, || panic!("should not format"));
    }

    #[test]
    fn log_if_enabled_writes_when_enabled() {
        let sink = RecordingSink::default();
        log_if_enabled(&sink, Level::Warn, || "hello".to_string());
        assert_eq!(sink.messages.lock().unwrap().as_slice(), ["hello"]);
    }
}
