//! Box reveal state machine
//!
//! Per box: `Unopened -> Revealing -> Opened`. Board-wide there is a single
//! gate (`Idle -> Busy -> Idle`) so only one box is ever mid-reveal. The
//! reveal itself is two timed suspension points (suspense, then settle)
//! awaited through [`Delay`], after which the box is locked until reset.
//!
//! All state sits behind a `RefCell` and no borrow is held across an await,
//! so overlapping `open` futures on one thread see each other's gate.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use thiserror::Error;

use super::assign::Assignment;
use super::prize::Prize;
use crate::consts::{DEFAULT_SETTLE_MS, DEFAULT_SUSPENSE_MS};
use crate::platform::Delay;

/// Where a single box is in its reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxState {
    Unopened,
    /// Suspense or opening animation in progress
    Revealing,
    /// Prize shown; locked until reset
    Opened,
}

/// Why an `open` did not produce a prize
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("box {0} has already been opened")]
    AlreadyOpened(u32),
    #[error("another box is being revealed")]
    Busy,
    #[error("box {0} is not on the board")]
    UnknownBox(u32),
    /// The board was reset while this box was mid-reveal
    #[error("box {0} reveal was superseded by a reset")]
    Superseded(u32),
    #[error("reveal of box {box_id} failed: {reason}")]
    Fault { box_id: u32, reason: String },
}

/// Durations of the two reveal stages (ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    pub suspense_ms: u32,
    pub settle_ms: u32,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            suspense_ms: DEFAULT_SUSPENSE_MS,
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

/// Presentation collaborator. Every hook is fire-and-forget.
pub trait Presenter {
    /// Suspense stage started
    fn on_suspense(&self, _box_id: u32) {}
    /// Suspense finished, opening animation started
    fn on_opening(&self, _box_id: u32) {}
    /// Box locked with its prize
    fn on_revealed(&self, box_id: u32, prize: &Prize);
    /// Assignment or opened set changed; the whole board should re-render
    fn on_board_changed(&self) {}
}

/// Presenter that ignores everything (headless use)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn on_revealed(&self, _box_id: u32, _prize: &Prize) {}
}

#[derive(Debug, Default)]
struct RevealState {
    opened: BTreeSet<u32>,
    /// Box holding the gate, if any
    revealing: Option<u32>,
    /// Bumped on every reset
    round: u64,
}

/// Holds the gate for one reveal and releases it however the reveal ends
struct GateGuard<'a> {
    state: &'a RefCell<RevealState>,
    box_id: u32,
    round: u64,
    settled: bool,
}

impl GateGuard<'_> {
    fn is_current(&self) -> bool {
        self.state.borrow().round == self.round
    }

    /// Lock the box and release the gate
    fn settle(mut self) {
        {
            let mut state = self.state.borrow_mut();
            state.opened.insert(self.box_id);
            state.revealing = None;
        }
        self.settled = true;
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // A reset already released the gate for a newer round
        if let Ok(mut state) = self.state.try_borrow_mut() {
            if state.round == self.round && state.revealing == Some(self.box_id) {
                state.revealing = None;
            }
        }
    }
}

/// Tracks opened boxes and enforces single-flight reveals
pub struct RevealStateMachine<D: Delay> {
    delay: D,
    timing: Cell<RevealTiming>,
    state: RefCell<RevealState>,
}

impl<D: Delay> RevealStateMachine<D> {
    pub fn new(delay: D, timing: RevealTiming) -> Self {
        Self {
            delay,
            timing: Cell::new(timing),
            state: RefCell::new(RevealState::default()),
        }
    }

    pub fn timing(&self) -> RevealTiming {
        self.timing.get()
    }

    /// Takes effect from the next `open`
    pub fn set_timing(&self, timing: RevealTiming) {
        self.timing.set(timing);
    }

    pub fn state(&self, box_id: u32) -> BoxState {
        let state = self.state.borrow();
        if state.opened.contains(&box_id) {
            BoxState::Opened
        } else if state.revealing == Some(box_id) {
            BoxState::Revealing
        } else {
            BoxState::Unopened
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().revealing.is_some()
    }

    pub fn is_opened(&self, box_id: u32) -> bool {
        self.state.borrow().opened.contains(&box_id)
    }

    pub fn opened_count(&self) -> usize {
        self.state.borrow().opened.len()
    }

    /// Opened box ids in ascending order
    pub fn opened(&self) -> Vec<u32> {
        self.state.borrow().opened.iter().copied().collect()
    }

    /// Reveal `box_id` from `assignment`.
    pub async fn open(
        &self,
        box_id: u32,
        assignment: &Assignment,
        presenter: &dyn Presenter,
    ) -> Result<Prize, RejectReason> {
        self.open_with(box_id, |id| assignment.get(id).cloned(), presenter)
            .await
    }

    /// Reveal `box_id`, resolving its prize through `lookup`.
    ///
    /// `lookup` is consulted once up front (unknown boxes are rejected
    /// before the gate is taken) and again once the animation has played.
    /// A miss the second time is a fault: the gate is released and the box
    /// stays unopened.
    pub async fn open_with<F>(
        &self,
        box_id: u32,
        lookup: F,
        presenter: &dyn Presenter,
    ) -> Result<Prize, RejectReason>
    where
        F: Fn(u32) -> Option<Prize>,
    {
        let guard = {
            let mut state = self.state.borrow_mut();
            if state.opened.contains(&box_id) {
                log::warn!("Box {} already opened", box_id);
                return Err(RejectReason::AlreadyOpened(box_id));
            }
            if let Some(current) = state.revealing {
                log::warn!("Box {} ignored: box {} is mid-reveal", box_id, current);
                return Err(RejectReason::Busy);
            }
            if lookup(box_id).is_none() {
                log::warn!("No prize mapped to box {}", box_id);
                return Err(RejectReason::UnknownBox(box_id));
            }
            state.revealing = Some(box_id);
            GateGuard {
                state: &self.state,
                box_id,
                round: state.round,
                settled: false,
            }
        };

        let timing = self.timing.get();

        presenter.on_suspense(box_id);
        self.delay.sleep(timing.suspense_ms).await;
        if !guard.is_current() {
            return Err(RejectReason::Superseded(box_id));
        }

        presenter.on_opening(box_id);
        self.delay.sleep(timing.settle_ms).await;
        if !guard.is_current() {
            return Err(RejectReason::Superseded(box_id));
        }

        let Some(prize) = lookup(box_id) else {
            log::error!("Prize for box {} vanished mid-reveal", box_id);
            return Err(RejectReason::Fault {
                box_id,
                reason: "assignment changed during reveal".to_string(),
            });
        };

        guard.settle();
        log::info!("Box {} revealed: {}", box_id, prize);
        presenter.on_revealed(box_id, &prize);
        Ok(prize)
    }

    /// Clear the opened set and force the gate idle. Any reveal still in
    /// flight finishes as [`RejectReason::Superseded`]. Callers must assign
    /// a fresh board before the next `open`.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(box_id) = state.revealing.take() {
            log::warn!("Reset while box {} was mid-reveal", box_id);
        }
        state.opened.clear();
        state.round += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::assign::PrizeAssigner;
    use crate::platform::YieldDelay;
    use futures::executor::block_on;
    use futures::task::noop_waker;
    use futures::future::LocalBoxFuture;
    use std::future::Future;
    use std::rc::Rc;
    use std::task::{Context, Poll};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Suspense(u32),
        Opening(u32),
        Revealed(u32, Prize),
    }

    #[derive(Default)]
    struct RecordingPresenter {
        events: RefCell<Vec<Event>>,
    }

    impl Presenter for RecordingPresenter {
        fn on_suspense(&self, box_id: u32) {
            self.events.borrow_mut().push(Event::Suspense(box_id));
        }
        fn on_opening(&self, box_id: u32) {
            self.events.borrow_mut().push(Event::Opening(box_id));
        }
        fn on_revealed(&self, box_id: u32, prize: &Prize) {
            self.events
                .borrow_mut()
                .push(Event::Revealed(box_id, prize.clone()));
        }
    }

    /// Yields like `YieldDelay` and records each requested duration
    #[derive(Default)]
    struct RecordingDelay {
        requested: RefCell<Vec<u32>>,
    }

    impl Delay for RecordingDelay {
        fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
            self.requested.borrow_mut().push(ms);
            YieldDelay.sleep(ms)
        }
    }

    fn board(n: u32) -> Assignment {
        let prizes: Vec<Prize> = (1..=n)
            .map(|i| Prize::new(format!("Prize {i}"), format!("£{i}")))
            .collect();
        PrizeAssigner::new(11).assign(&prizes, n, &[]).unwrap()
    }

    fn machine() -> RevealStateMachine<YieldDelay> {
        RevealStateMachine::new(YieldDelay, RevealTiming::default())
    }

    #[test]
    fn test_open_returns_mapped_prize() {
        let m = machine();
        let a = board(5);
        let prize = block_on(m.open(3, &a, &NoopPresenter)).unwrap();

        assert_eq!(Some(&prize), a.get(3));
        assert_eq!(m.state(3), BoxState::Opened);
        assert!(!m.is_busy());
        assert_eq!(m.opened(), vec![3]);
    }

    #[test]
    fn test_second_open_after_settle_is_already_opened() {
        let m = machine();
        let a = board(5);
        assert!(block_on(m.open(2, &a, &NoopPresenter)).is_ok());
        assert_eq!(
            block_on(m.open(2, &a, &NoopPresenter)),
            Err(RejectReason::AlreadyOpened(2))
        );
    }

    #[test]
    fn test_overlapping_open_is_busy() {
        let m = machine();
        let a = board(5);
        let (first, second) = block_on(async {
            futures::join!(
                m.open(1, &a, &NoopPresenter),
                m.open(1, &a, &NoopPresenter)
            )
        });

        assert!(first.is_ok());
        assert_eq!(second, Err(RejectReason::Busy));
        assert_eq!(m.opened_count(), 1);
    }

    #[test]
    fn test_other_box_is_busy_during_reveal() {
        let m = machine();
        let a = board(5);
        let (first, second) = block_on(async {
            futures::join!(
                m.open(1, &a, &NoopPresenter),
                m.open(4, &a, &NoopPresenter)
            )
        });

        assert!(first.is_ok());
        assert_eq!(second, Err(RejectReason::Busy));
        assert_eq!(m.state(4), BoxState::Unopened);
    }

    #[test]
    fn test_unknown_box_rejected_without_taking_gate() {
        let m = machine();
        let a = board(5);
        assert_eq!(
            block_on(m.open(6, &a, &NoopPresenter)),
            Err(RejectReason::UnknownBox(6))
        );
        assert_eq!(
            block_on(m.open(0, &a, &NoopPresenter)),
            Err(RejectReason::UnknownBox(0))
        );
        assert!(!m.is_busy());
    }

    #[test]
    fn test_stages_run_in_order() {
        let delay = Rc::new(RecordingDelay::default());
        let m = RevealStateMachine::new(
            delay.clone(),
            RevealTiming {
                suspense_ms: 1500,
                settle_ms: 800,
            },
        );
        let a = board(3);
        let presenter = RecordingPresenter::default();

        let prize = block_on(m.open(2, &a, &presenter)).unwrap();

        assert_eq!(*delay.requested.borrow(), vec![1500, 800]);
        assert_eq!(
            *presenter.events.borrow(),
            vec![
                Event::Suspense(2),
                Event::Opening(2),
                Event::Revealed(2, prize)
            ]
        );
    }

    #[test]
    fn test_box_is_revealing_while_suspended() {
        let m = machine();
        let a = board(3);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut fut = Box::pin(m.open(1, &a, &NoopPresenter));
        assert!(fut.as_mut().poll(&mut cx).is_pending());
        assert_eq!(m.state(1), BoxState::Revealing);
        assert!(m.is_busy());

        // Settle delay
        assert!(fut.as_mut().poll(&mut cx).is_pending());
        assert_eq!(m.state(1), BoxState::Revealing);

        assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Ready(Ok(_))));
        assert_eq!(m.state(1), BoxState::Opened);
    }

    #[test]
    fn test_dropped_reveal_releases_gate() {
        let m = machine();
        let a = board(3);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut fut = Box::pin(m.open(1, &a, &NoopPresenter));
        assert!(fut.as_mut().poll(&mut cx).is_pending());
        drop(fut);

        assert!(!m.is_busy());
        assert_eq!(m.state(1), BoxState::Unopened);
        assert!(block_on(m.open(1, &a, &NoopPresenter)).is_ok());
    }

    #[test]
    fn test_fault_releases_gate() {
        let m = machine();
        let calls = Cell::new(0);
        let lookup = |_id: u32| {
            calls.set(calls.get() + 1);
            (calls.get() == 1).then(|| Prize::new("Rod", "£10"))
        };

        let result = block_on(m.open_with(1, lookup, &NoopPresenter));

        assert!(matches!(result, Err(RejectReason::Fault { box_id: 1, .. })));
        assert!(!m.is_busy());
        assert_eq!(m.state(1), BoxState::Unopened);
    }

    #[test]
    fn test_reset_clears_opened_and_gate() {
        let m = machine();
        let a = board(4);
        block_on(m.open(1, &a, &NoopPresenter)).unwrap();
        block_on(m.open(2, &a, &NoopPresenter)).unwrap();
        assert_eq!(m.opened_count(), 2);

        m.reset();

        assert_eq!(m.opened_count(), 0);
        assert!(!m.is_busy());
        assert!(block_on(m.open(1, &a, &NoopPresenter)).is_ok());
    }

    #[test]
    fn test_reset_while_busy() {
        let m = machine();
        let a = board(4);
        let (result, busy_after_reset) = block_on(async {
            futures::join!(m.open(3, &a, &NoopPresenter), async {
                assert!(m.is_busy());
                m.reset();
                m.is_busy()
            })
        });

        assert!(!busy_after_reset);
        assert_eq!(result, Err(RejectReason::Superseded(3)));
        assert_eq!(m.opened_count(), 0);
        assert!(!m.is_busy());
    }

    #[test]
    fn test_stale_reveal_leaves_new_round_alone() {
        let m = machine();
        let a = board(4);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut stale = Box::pin(m.open(1, &a, &NoopPresenter));
        assert!(stale.as_mut().poll(&mut cx).is_pending());
        m.reset();

        // New round's reveal takes the gate before the stale one wakes
        let mut fresh = Box::pin(m.open(2, &a, &NoopPresenter));
        assert!(fresh.as_mut().poll(&mut cx).is_pending());

        assert_eq!(
            stale.as_mut().poll(&mut cx),
            Poll::Ready(Err(RejectReason::Superseded(1)))
        );
        drop(stale);
        assert!(m.is_busy());
        assert_eq!(m.state(2), BoxState::Revealing);

        assert!(fresh.as_mut().poll(&mut cx).is_pending());
        assert!(matches!(fresh.as_mut().poll(&mut cx), Poll::Ready(Ok(_))));
        assert_eq!(m.opened(), vec![2]);
    }
}
