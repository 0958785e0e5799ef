use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct SearchDebouncer {
    delay: Duration,
    pending: Option<PendingSearch>,
}

#[derive(Debug)]
struct PendingSearch {
    text: String,
    dirty_since: Instant,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FlushKind {
    Debounced,
    Immediate,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some(PendingSearch {
            text: text.into(),
            dirty_since: now,
        });
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_text(&self) -> Option<&str> {
        self.pending.as_ref().map(|pending| pending.text.as_str())
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let pending = self.pending.as_ref()?;
        Some(
            self.delay
                .saturating_sub(now.saturating_duration_since(pending.dirty_since)),
        )
    }

    pub fn poll(&mut self, now: Instant) -> Option<String> {
        self.take(FlushKind::Debounced, now)
    }

    pub fn flush_now(&mut self) -> Option<String> {
        self.take(FlushKind::Immediate, Instant::now())
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    fn take(&mut self, mode: FlushKind, now: Instant) -> Option<String> {
        let pending = self.pending.as_ref()?;
        if mode == FlushKind::Debounced
            && now.saturating_duration_since(pending.dirty_since) < self.delay
        {
            return None;
        }
        self.pending.take().map(|pending| pending.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_last_input_in_the_window_fires() {
        let start = Instant::now();
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(250));
        debouncer.schedule("c", start);
        debouncer.schedule("cs", start + Duration::from_millis(100));
        debouncer.schedule("css", start + Duration::from_millis(200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(300)), None);
        assert_eq!(
            debouncer.remaining(start + Duration::from_millis(300)),
            Some(Duration::from_millis(150))
        );
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(450)).as_deref(),
            Some("css")
        );
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn flush_now_skips_the_idle_window() {
        let mut debouncer = SearchDebouncer::new(Duration::from_secs(60));
        debouncer.schedule("web", Instant::now());
        assert_eq!(debouncer.pending_text(), Some("web"));
        assert_eq!(debouncer.flush_now().as_deref(), Some("web"));
        assert_eq!(debouncer.flush_now(), None);
    }

    #[test]
    fn cancel_drops_pending_input() {
        let now = Instant::now();
        let mut debouncer = SearchDebouncer::new(Duration::ZERO);
        debouncer.schedule("x", now);
        assert_eq!(debouncer.remaining(now), Some(debouncer.delay()));
        debouncer.cancel();
        assert_eq!(debouncer.remaining(now), None);
        assert_eq!(debouncer.poll(now), None);
    }
}
