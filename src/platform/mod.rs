//! Platform abstraction layer
//!
//! Handles browser/native differences for timed suspension. The reveal
//! sequence only ever waits through [`Delay`], so it runs unchanged on a
//! browser event loop, under a native executor, or in tests.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::LocalBoxFuture;

/// Timed suspension point. Implementations must yield to the executor
/// rather than block the thread.
pub trait Delay {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

impl<D: Delay + ?Sized> Delay for std::rc::Rc<D> {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        (**self).sleep(ms)
    }
}

/// Yields once to the executor and resumes without waiting wall-clock time.
///
/// Used for headless draws and tests: ordering is preserved, duration is not.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldDelay;

impl Delay for YieldDelay {
    fn sleep(&self, _ms: u32) -> LocalBoxFuture<'static, ()> {
        Box::pin(YieldOnce::default())
    }
}

#[derive(Debug, Default)]
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// `setTimeout` wrapped in a promise (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutDelay;

#[cfg(target_arch = "wasm32")]
impl Delay for TimeoutDelay {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().and_then(|w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout)
                    .ok()
            });
            if scheduled.is_none() {
                log::warn!("setTimeout unavailable, resolving delay immediately");
                let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
            }
        });
        Box::pin(async move {
            if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
                log::error!("Delay promise rejected: {:?}", e);
            }
        })
    }
}

/// F5, Ctrl+R or Cmd+R
pub fn is_reload_shortcut(key: &str, ctrl: bool, meta: bool) -> bool {
    key == "F5" || ((ctrl || meta) && key.eq_ignore_ascii_case("r"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::task::noop_waker;

    #[test]
    fn test_yield_delay_is_pending_once() {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut fut = YieldDelay.sleep(500);

        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Pending);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn test_yield_delay_completes_under_executor() {
        block_on(YieldDelay.sleep(2000));
    }

    #[test]
    fn test_reload_shortcuts() {
        assert!(is_reload_shortcut("F5", false, false));
        assert!(is_reload_shortcut("r", true, false));
        assert!(is_reload_shortcut("R", false, true));
        assert!(!is_reload_shortcut("r", false, false));
        assert!(!is_reload_shortcut("F4", true, false));
    }
}
