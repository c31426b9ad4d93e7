//! Terminal bell as the "system" notification channel.

use std::io::{self, Write};

use chartdesk_core::alerts::Notifier;

/// Rings the terminal bell. Alerts fall back to toasts when disabled or when
/// the write fails.
pub struct BellNotifier<W: Write + Send = io::Stdout> {
    out: W,
    enabled: bool,
}

impl BellNotifier {
    pub fn stdout(enabled: bool) -> Self {
        Self::new(io::stdout(), enabled)
    }
}

impl<W: Write + Send> BellNotifier<W> {
    pub fn new(out: W, enabled: bool) -> Self {
        Self { out, enabled }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl<W: Write + Send> Notifier for BellNotifier<W> {
    fn is_permitted(&self) -> bool {
        self.enabled
    }

    fn notify(&mut self, title: &str, _body: &str) -> bool {
        tracing::debug!(title, "ringing bell");
        self.out.write_all(b"\x07").and_then(|()| self.out.flush()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn rings_bell_when_enabled() {
        let mut bell = BellNotifier::new(Vec::new(), true);
        assert!(bell.is_permitted());
        assert!(bell.notify("Alert", "body"));
        assert_eq!(bell.out, b"\x07");
    }

    #[test]
    fn disabled_bell_is_not_permitted() {
        let mut bell = BellNotifier::new(Vec::new(), true);
        bell.set_enabled(false);
        assert!(!bell.is_permitted());
    }

    #[test]
    fn write_failure_reports_undelivered() {
        let mut bell = BellNotifier::new(Broken, true);
        assert!(!bell.notify("Alert", "body"));
    }
}
