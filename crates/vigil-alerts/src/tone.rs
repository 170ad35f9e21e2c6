//! Audible alert cue, gated by a prior user interaction.
//!
//! Browsers refuse autoplay until the user has interacted with the page; the
//! console keeps the same contract so the behavior is identical wherever the
//! chrome runs. Until [`ToneEmitter::arm`] has been called, [`ToneEmitter::play`]
//! does nothing at all. Sound is a best-effort enhancement: a failing primary
//! sink falls back to a synthesized tone, and a failing fallback is logged
//! and swallowed.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

/// A playback backend for the alert cue.
///
/// The chrome injects a real audio backend here; tests inject counting stubs.
pub trait ToneSink: Send + Sync {
    /// Attempt to play the cue once.
    fn emit(&self) -> std::io::Result<()>;

    /// Name used in log messages.
    fn name(&self) -> &'static str;
}

/// Terminal-bell sink (ASCII BEL).
///
/// This is the synthesized-tone fallback: most terminals emit an audible
/// beep or a visual bell for BEL depending on settings.
#[derive(Debug, Default)]
pub struct BellSink;

impl ToneSink for BellSink {
    fn emit(&self) -> std::io::Result<()> {
        let mut stdout = std::io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()
    }

    fn name(&self) -> &'static str {
        "bell"
    }
}

struct ToneInner {
    enabled: bool,
    armed: AtomicBool,
    primary: Option<Box<dyn ToneSink>>,
    fallback: Box<dyn ToneSink>,
}

/// Gesture-gated tone emitter.
///
/// Cheap to clone; all clones share the armed flag and sinks.
#[derive(Clone)]
pub struct ToneEmitter {
    inner: Arc<ToneInner>,
}

impl ToneEmitter {
    /// Create an emitter with an optional primary sink and a fallback sink.
    pub fn new(primary: Option<Box<dyn ToneSink>>, fallback: Box<dyn ToneSink>, enabled: bool) -> Self {
        Self {
            inner: Arc::new(ToneInner {
                enabled,
                armed: AtomicBool::new(false),
                primary,
                fallback,
            }),
        }
    }

    /// Create a bell-only emitter (no primary audio asset).
    pub fn bell(enabled: bool) -> Self {
        Self::new(None, Box::new(BellSink), enabled)
    }

    /// Arm the emitter in response to a genuine user gesture.
    ///
    /// Idempotent: returns true only on the first call. Callers should drop
    /// their gesture listener once this returns true.
    pub fn arm(&self) -> bool {
        let first = !self.inner.armed.swap(true, Ordering::SeqCst);
        if first {
            debug!("tone emitter armed");
        }
        first
    }

    /// Returns true if the emitter has been armed.
    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::SeqCst)
    }

    /// Play the alert cue.
    ///
    /// Strict no-op before arming (never errors, never queues). After arming,
    /// tries the primary sink, then the fallback, and swallows any failure.
    pub fn play(&self) {
        if !self.inner.enabled || !self.is_armed() {
            return;
        }

        if let Some(primary) = &self.inner.primary {
            match primary.emit() {
                Ok(()) => return,
                Err(e) => warn!(sink = primary.name(), error = %e, "primary tone sink failed"),
            }
        }

        if let Err(e) = self.inner.fallback.emit() {
            warn!(sink = self.inner.fallback.name(), error = %e, "fallback tone sink failed");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_sinks {
    use super::ToneSink;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sink that counts attempts and optionally fails every one of them.
    pub struct CountingSink {
        pub attempts: Arc<AtomicUsize>,
        pub fail: bool,
    }

    impl CountingSink {
        pub fn new(fail: bool) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    attempts: Arc::clone(&attempts),
                    fail,
                },
                attempts,
            )
        }
    }

    impl ToneSink for CountingSink {
        fn emit(&self) -> std::io::Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(std::io::Error::other("decode error"))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_sinks::CountingSink;
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_play_before_arm_is_a_noop() {
        let (sink, attempts) = CountingSink::new(false);
        let emitter = ToneEmitter::new(Some(Box::new(sink)), Box::new(BellSink), true);

        emitter.play();
        emitter.play();

        assert_eq!(attempts.load(Ordering::SeqCst), 0);
        assert!(!emitter.is_armed());
    }

    #[test]
    fn test_play_after_arm_attempts_once_per_call() {
        let (sink, attempts) = CountingSink::new(false);
        let emitter = ToneEmitter::new(Some(Box::new(sink)), Box::new(BellSink), true);

        assert!(emitter.arm());
        emitter.play();
        emitter.play();

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_arm_is_idempotent() {
        let emitter = ToneEmitter::bell(true);
        assert!(emitter.arm());
        assert!(!emitter.arm());
        assert!(!emitter.arm());
        assert!(emitter.is_armed());
    }

    #[test]
    fn test_failed_primary_falls_back() {
        let (primary, primary_attempts) = CountingSink::new(true);
        let (fallback, fallback_attempts) = CountingSink::new(false);
        let emitter = ToneEmitter::new(Some(Box::new(primary)), Box::new(fallback), true);

        emitter.arm();
        emitter.play();

        assert_eq!(primary_attempts.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_fallback_is_swallowed() {
        let (primary, _) = CountingSink::new(true);
        let (fallback, _) = CountingSink::new(true);
        let emitter = ToneEmitter::new(Some(Box::new(primary)), Box::new(fallback), true);

        emitter.arm();
        // Both sinks fail; play must not panic or surface anything.
        emitter.play();
    }

    #[test]
    fn test_disabled_emitter_never_plays() {
        let (sink, attempts) = CountingSink::new(false);
        let emitter = ToneEmitter::new(Some(Box::new(sink)), Box::new(BellSink), false);

        emitter.arm();
        emitter.play();

        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }
}
