//! Proportional scroll synchronization between the source and rendered panes.
//!
//! A scroll on one pane scrolls the other to the same relative position.
//! The program-driven scroll on the receiving pane would itself fire a scroll
//! event, so a single in-flight token blocks every sync until that scroll has
//! settled. How it settles is a [`SettleStrategy`]: either the environment's
//! scroll-completed signal, or a fixed timeout. One strategy per synchronizer;
//! events belonging to the other are ignored.

/// Default delay before a program-driven scroll counts as settled.
pub const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 100;

/// Positions closer than this (in pixels) need no programmatic scroll.
const ALIGNED_EPSILON: f64 = 0.5;

/// The two synchronized panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Source,
    Rendered,
}

impl Pane {
    pub const fn other(self) -> Self {
        match self {
            Self::Source => Self::Rendered,
            Self::Rendered => Self::Source,
        }
    }
}

/// Scroll geometry of one pane, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl PaneMetrics {
    pub const fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// How far the pane can scroll; zero when content fits the viewport.
    pub fn scroll_range(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }
}

/// A scrollable pane in the host environment.
pub trait ScrollPane {
    fn metrics(&self) -> PaneMetrics;

    /// Programmatically scroll so that `scroll_top == top`.
    fn scroll_to(&mut self, top: f64);
}

/// Map the source pane's relative position onto the target pane.
///
/// The source range is floored at one pixel so content shorter than its
/// viewport never divides by zero; a target without range is pinned to 0.
pub fn sync_scroll_top(source: PaneMetrics, target: PaneMetrics) -> f64 {
    let source_range = (source.scroll_height - source.client_height).max(1.0);
    let ratio = (source.scroll_top / source_range).clamp(0.0, 1.0);
    ratio * target.scroll_range()
}

/// How an in-flight sync is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Wait for the environment's scroll-completed signal on the target pane.
    ScrollEnd,
    /// Release after a fixed delay.
    Timeout { ms: u64 },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        Self::Timeout {
            ms: DEFAULT_SETTLE_TIMEOUT_MS,
        }
    }
}

/// Result of handling one scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// A sync was in flight; the event was swallowed.
    Ignored,
    /// The target already sat at the mapped position; nothing was scrolled.
    Aligned,
    /// The target pane was scrolled to `top`.
    Synced { target: Pane, top: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    target: Pane,
    started_ms: u64,
}

/// Reentrancy-guarded synchronizer shared by both scroll directions.
#[derive(Debug, Clone, Default)]
pub struct ScrollSync {
    strategy: SettleStrategy,
    in_flight: Option<InFlight>,
}

impl ScrollSync {
    pub const fn new(strategy: SettleStrategy) -> Self {
        Self {
            strategy,
            in_flight: None,
        }
    }

    pub const fn strategy(&self) -> SettleStrategy {
        self.strategy
    }

    pub const fn is_syncing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Handle a scroll event fired by `origin`.
    ///
    /// `source` and `rendered` are the two panes; which one is read and which
    /// one is scrolled follows from `origin`.
    pub fn on_scroll(
        &mut self,
        origin: Pane,
        source: &mut dyn ScrollPane,
        rendered: &mut dyn ScrollPane,
        now_ms: u64,
    ) -> SyncOutcome {
        self.tick(now_ms);
        if let Some(in_flight) = self.in_flight {
            tracing::trace!(?origin, target = ?in_flight.target, "sync in flight, scroll ignored");
            return SyncOutcome::Ignored;
        }

        let (from, to) = match origin {
            Pane::Source => (source.metrics(), rendered.metrics()),
            Pane::Rendered => (rendered.metrics(), source.metrics()),
        };
        let top = sync_scroll_top(from, to);

        // No movement means no scroll-completed signal would ever arrive.
        if (top - to.scroll_top).abs() < ALIGNED_EPSILON {
            return SyncOutcome::Aligned;
        }

        let target = origin.other();
        self.in_flight = Some(InFlight {
            target,
            started_ms: now_ms,
        });
        match target {
            Pane::Source => source.scroll_to(top),
            Pane::Rendered => rendered.scroll_to(top),
        }
        SyncOutcome::Synced { target, top }
    }

    /// Scroll-completed signal from `pane`. Returns true if it released the
    /// in-flight sync.
    pub fn on_scroll_end(&mut self, pane: Pane) -> bool {
        if self.strategy != SettleStrategy::ScrollEnd {
            return false;
        }
        match self.in_flight {
            Some(in_flight) if in_flight.target == pane => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Timer tick. Returns true if it released the in-flight sync.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let SettleStrategy::Timeout { ms } = self.strategy else {
            return false;
        };
        match self.in_flight {
            Some(in_flight) if now_ms.saturating_sub(in_flight.started_ms) >= ms => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakePane {
        metrics: PaneMetrics,
        scrolls: Vec<f64>,
    }

    impl FakePane {
        fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
            Self {
                metrics: PaneMetrics::new(scroll_top, scroll_height, client_height),
                scrolls: Vec::new(),
            }
        }
    }

    impl ScrollPane for FakePane {
        fn metrics(&self) -> PaneMetrics {
            self.metrics
        }

        fn scroll_to(&mut self, top: f64) {
            self.metrics.scroll_top = top;
            self.scrolls.push(top);
        }
    }

    #[test]
    fn test_ratio_maps_onto_target_range() {
        let source = PaneMetrics::new(250.0, 1000.0, 500.0);
        let target = PaneMetrics::new(0.0, 2000.0, 1000.0);
        assert!((sync_scroll_top(source, target) - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_short_source_does_not_divide_by_zero() {
        let source = PaneMetrics::new(0.0, 300.0, 500.0);
        let target = PaneMetrics::new(0.0, 2000.0, 1000.0);
        let top = sync_scroll_top(source, target);
        assert!(top.is_finite());
        assert!(top.abs() < f64::EPSILON);
    }

    #[test]
    fn test_target_without_range_is_pinned_to_zero() {
        let source = PaneMetrics::new(400.0, 1000.0, 500.0);
        let target = PaneMetrics::new(0.0, 500.0, 500.0);
        assert!(sync_scroll_top(source, target).abs() < f64::EPSILON);
    }

    #[test]
    fn test_source_scroll_syncs_rendered_pane() {
        let mut sync = ScrollSync::default();
        let mut source = FakePane::new(250.0, 1000.0, 500.0);
        let mut rendered = FakePane::new(0.0, 2000.0, 1000.0);

        let outcome = sync.on_scroll(Pane::Source, &mut source, &mut rendered, 0);
        assert_eq!(
            outcome,
            SyncOutcome::Synced {
                target: Pane::Rendered,
                top: 500.0,
            }
        );
        assert_eq!(rendered.scrolls, vec![500.0]);
        assert!(source.scrolls.is_empty());
        assert!(sync.is_syncing());
    }

    #[test]
    fn test_echo_scroll_is_swallowed_until_timeout() {
        let mut sync = ScrollSync::new(SettleStrategy::Timeout { ms: 100 });
        let mut source = FakePane::new(250.0, 1000.0, 500.0);
        let mut rendered = FakePane::new(0.0, 2000.0, 1000.0);
        sync.on_scroll(Pane::Source, &mut source, &mut rendered, 1_000);

        // The programmatic scroll fires a scroll event on the rendered pane.
        let echo = sync.on_scroll(Pane::Rendered, &mut source, &mut rendered, 1_010);
        assert_eq!(echo, SyncOutcome::Ignored);
        assert!(source.scrolls.is_empty(), "no oscillation back onto the source");

        assert!(!sync.tick(1_050));
        assert!(sync.tick(1_100));
        assert!(!sync.is_syncing());
    }

    #[test]
    fn test_expired_timeout_releases_without_tick() {
        let mut sync = ScrollSync::new(SettleStrategy::Timeout { ms: 100 });
        let mut source = FakePane::new(250.0, 1000.0, 500.0);
        let mut rendered = FakePane::new(0.0, 2000.0, 1000.0);
        sync.on_scroll(Pane::Source, &mut source, &mut rendered, 0);

        source.metrics.scroll_top = 0.0;
        assert_eq!(
            sync.on_scroll(Pane::Source, &mut source, &mut rendered, 50),
            SyncOutcome::Ignored
        );
        let outcome = sync.on_scroll(Pane::Source, &mut source, &mut rendered, 10_000);
        assert_eq!(
            outcome,
            SyncOutcome::Synced {
                target: Pane::Rendered,
                top: 0.0,
            }
        );
        assert_eq!(rendered.scrolls, vec![500.0, 0.0]);
    }

    #[test]
    fn test_scroll_end_releases_only_for_target_pane() {
        let mut sync = ScrollSync::new(SettleStrategy::ScrollEnd);
        let mut source = FakePane::new(0.0, 1000.0, 500.0);
        let mut rendered = FakePane::new(750.0, 2000.0, 1000.0);
        sync.on_scroll(Pane::Rendered, &mut source, &mut rendered, 0);
        assert_eq!(source.scrolls, vec![375.0]);

        assert!(!sync.on_scroll_end(Pane::Rendered));
        assert!(!sync.tick(10_000), "timer events are ignored under ScrollEnd");
        assert!(sync.is_syncing());
        assert!(sync.on_scroll_end(Pane::Source));
        assert!(!sync.is_syncing());
    }

    #[test]
    fn test_timeout_strategy_ignores_scroll_end() {
        let mut sync = ScrollSync::default();
        let mut source = FakePane::new(100.0, 1000.0, 500.0);
        let mut rendered = FakePane::new(0.0, 2000.0, 1000.0);
        sync.on_scroll(Pane::Source, &mut source, &mut rendered, 0);
        assert!(!sync.on_scroll_end(Pane::Rendered));
        assert!(sync.is_syncing());
    }

    #[test]
    fn test_aligned_panes_do_not_arm_the_guard() {
        let mut sync = ScrollSync::new(SettleStrategy::ScrollEnd);
        let mut source = FakePane::new(0.0, 1000.0, 500.0);
        let mut rendered = FakePane::new(0.0, 2000.0, 1000.0);
        assert_eq!(
            sync.on_scroll(Pane::Source, &mut source, &mut rendered, 0),
            SyncOutcome::Aligned
        );
        assert!(!sync.is_syncing());
        assert!(rendered.scrolls.is_empty());
    }

    #[test]
    fn test_sync_resumes_after_release() {
        let mut sync = ScrollSync::default();
        let mut source = FakePane::new(500.0, 1000.0, 500.0);
        let mut rendered = FakePane::new(0.0, 2000.0, 1000.0);
        sync.on_scroll(Pane::Source, &mut source, &mut rendered, 0);
        sync.tick(DEFAULT_SETTLE_TIMEOUT_MS);

        source.metrics.scroll_top = 0.0;
        let outcome = sync.on_scroll(Pane::Source, &mut source, &mut rendered, 200);
        assert_eq!(
            outcome,
            SyncOutcome::Synced {
                target: Pane::Rendered,
                top: 0.0,
            }
        );
    }
}
