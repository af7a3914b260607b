use core::{
    future::{poll_fn, Future},
    task::Poll,
};

use portable_atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use atomic_waker::AtomicWaker;

/// The state of the WiFi link, as seen through the events reported by the NWP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No connection was requested, or the AP dropped us after we were connected.
    #[default]
    Disconnected,
    /// A connect request was issued, but the NWP hasn't reported anything yet.
    Connecting,
    /// We're associated with the AP, but don't have an IP address yet.
    Associated,
    /// An IPv4 address was acquired.
    Connected,
    /// The connect request was rejected, the AP dropped us while connecting or we gave up.
    Failed,
}

/// Holds the [LinkState] and wakes whoever is waiting for it to change.
pub(crate) struct LinkSignal {
    state: AtomicU8,
    waker: AtomicWaker,
}
impl LinkSignal {
    const DISCONNECTED: u8 = 0;
    const CONNECTING: u8 = 1;
    const ASSOCIATED: u8 = 2;
    const CONNECTED: u8 = 3;
    const FAILED: u8 = 4;
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(Self::DISCONNECTED),
            waker: AtomicWaker::new(),
        }
    }
    pub fn get(&self) -> LinkState {
        match self.state.load(Ordering::Acquire) {
            Self::CONNECTING => LinkState::Connecting,
            Self::ASSOCIATED => LinkState::Associated,
            Self::CONNECTED => LinkState::Connected,
            Self::FAILED => LinkState::Failed,
            _ => LinkState::Disconnected,
        }
    }
    pub fn set(&self, link_state: LinkState) {
        self.state.store(
            match link_state {
                LinkState::Disconnected => Self::DISCONNECTED,
                LinkState::Connecting => Self::CONNECTING,
                LinkState::Associated => Self::ASSOCIATED,
                LinkState::Connected => Self::CONNECTED,
                LinkState::Failed => Self::FAILED,
            },
            Ordering::Release,
        );
        self.waker.wake();
    }
    /// Wait until the state is something other than `seen`.
    pub fn changed_from(&self, seen: LinkState) -> impl Future<Output = LinkState> + '_ {
        poll_fn(move |cx| {
            // Register first, so a change between the load and the registration isn't lost.
            self.waker.register(cx.waker());
            let state = self.get();
            if state != seen {
                Poll::Ready(state)
            } else {
                Poll::Pending
            }
        })
    }
}

/// Hands interrupt edges from interrupt context to the code dispatching them.
///
/// Recording an edge is a single atomic increment, so it's safe to call from an ISR. While the
/// signal is masked, edges are still counted, but not handed out.
pub(crate) struct IrqSignal {
    waker: AtomicWaker,
    pending_edges: AtomicUsize,
    masked: AtomicBool,
}
impl IrqSignal {
    pub const fn new() -> Self {
        Self {
            waker: AtomicWaker::new(),
            pending_edges: AtomicUsize::new(0),
            masked: AtomicBool::new(false),
        }
    }
    /// Record one edge.
    pub fn put(&self) {
        self.pending_edges.fetch_add(1, Ordering::Relaxed);
        self.waker.wake();
    }
    pub fn set_masked(&self, masked: bool) {
        self.masked.store(masked, Ordering::Release);
        if !masked {
            // Edges latched while masked may be handed out now.
            self.waker.wake();
        }
    }
    pub fn is_masked(&self) -> bool {
        self.masked.load(Ordering::Acquire)
    }
    /// Take all edges recorded so far, unless masked.
    pub fn take(&self) -> usize {
        if self.is_masked() {
            return 0;
        }
        self.pending_edges.swap(0, Ordering::AcqRel)
    }
    /// Asynchronously wait for at least one edge, that can be handed out.
    pub async fn next(&self) -> usize {
        poll_fn(|cx| {
            self.waker.register(cx.waker());
            match self.take() {
                0 => Poll::Pending,
                edges => Poll::Ready(edges),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn masked_edges_are_latched() {
        let irq = IrqSignal::new();
        irq.set_masked(true);
        irq.put();
        irq.put();
        assert_eq!(irq.take(), 0);
        irq.set_masked(false);
        assert_eq!(irq.take(), 2);
        assert_eq!(irq.take(), 0);
    }

    #[test]
    fn next_returns_pending_edges() {
        let irq = IrqSignal::new();
        irq.put();
        assert_eq!(block_on(irq.next()), 1);
    }

    #[test]
    fn link_state_round_trips_through_the_signal() {
        let link = LinkSignal::new();
        assert_eq!(link.get(), LinkState::Disconnected);
        link.set(LinkState::Associated);
        assert_eq!(
            block_on(link.changed_from(LinkState::Connecting)),
            LinkState::Associated
        );
        link.set(LinkState::Failed);
        assert_eq!(link.get(), LinkState::Failed);
    }
}
