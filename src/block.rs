//! A single-poll executor that turns the crate's async TLS dependency into
//! the blocking calling convention §5 requires.
//!
//! Every `embedded_io_async::{Read, Write}` impl this crate hands to
//! `embedded-tls` (see `crate::adapters`) performs an ordinary blocking
//! syscall inside its `async fn` body and never actually awaits anything, so
//! the future it produces always resolves on the first poll. `block_on`
//! exploits exactly that: it polls once with a waker that does nothing (there
//! is nothing to wake — the future is already done) and returns.
//!
//! This keeps the teacher's `embedded-tls`-based TLS stack (§9, resolved)
//! while presenting the synchronous, single-threaded-cooperative API §5
//! specifies: the "suspension" happens inside the blocking syscall, not via
//! `.await`.

use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

fn noop(_: *const ()) {}
fn clone(_: *const ()) -> RawWaker {
    noop_raw_waker()
}
static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
fn noop_raw_waker() -> RawWaker {
    RawWaker::new(core::ptr::null(), &VTABLE)
}

/// Drives `fut` to completion, panicking if it ever yields `Poll::Pending`.
pub fn block_on<F: Future>(fut: F) -> F::Output {
    let mut fut = pin!(fut);
    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    match fut.as_mut().poll(&mut cx) {
        Poll::Ready(v) => v,
        Poll::Pending => {
            panic!("block_on: transport future did not resolve synchronously")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_ready_future_immediately() {
        assert_eq!(block_on(async { 1 + 1 }), 2);
    }
}
