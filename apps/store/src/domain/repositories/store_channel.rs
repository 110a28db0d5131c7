use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::domain::errors::AppError;

/// Outcome of a single store operation
pub type StoreResult<T> = Result<T, AppError>;

/// Receiving end of a store operation
///
/// The operation runs on its own tokio task and sends exactly one
/// [`StoreResult`]. Awaiting the channel yields that result. If the task
/// ends without sending, for example because it panicked, the channel
/// resolves to an internal error located at the operation that spawned it.
///
/// # Example
/// ```
/// use platform_store::domain::repositories::StoreChannel;
///
/// # #[tokio::main]
/// # async fn main() {
/// let channel = StoreChannel::spawn("Example.Answer", async { Ok(42) });
/// assert_eq!(channel.await, Ok(42));
/// # }
/// ```
#[must_use = "a store channel does nothing useful unless awaited"]
#[derive(Debug)]
pub struct StoreChannel<T> {
    location: &'static str,
    receiver: oneshot::Receiver<StoreResult<T>>,
}

impl<T: Send + 'static> StoreChannel<T> {
    /// Runs `work` on the tokio runtime and returns the channel its result
    /// will be delivered on
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(location: &'static str, work: F) -> Self
    where
        F: Future<Output = StoreResult<T>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();

        tokio::spawn(async move {
            let result = work.await;

            // The caller may have dropped the channel; the result is discarded then.
            let _ = sender.send(result);
        });

        Self { location, receiver }
    }
}

impl<T> StoreChannel<T> {
    /// Returns the operation this channel reports for
    pub fn location(&self) -> &'static str {
        self.location
    }
}

impl<T> Future for StoreChannel<T> {
    type Output = StoreResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(AppError::internal(
                this.location,
                "The store operation ended without a result",
                "",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    #[tokio::test]
    async fn delivers_success() {
        let channel = StoreChannel::spawn("Test.Success", async { Ok("done".to_string()) });

        assert_eq!(channel.location(), "Test.Success");
        assert_eq!(channel.await, Ok("done".to_string()));
    }

    #[tokio::test]
    async fn delivers_failure_unchanged() {
        let channel: StoreChannel<()> = StoreChannel::spawn("Test.Failure", async {
            Err(AppError::not_found("Test.Failure", "missing", "id=1"))
        });

        let err = channel.await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.details, "id=1");
    }

    #[tokio::test]
    async fn panicking_work_becomes_internal_error() {
        let fail = true;
        let channel: StoreChannel<u32> = StoreChannel::spawn("Test.Panic", async move {
            if fail {
                panic!("boom");
            }
            Ok(1)
        });

        let err = channel.await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.location, "Test.Panic");
    }

    #[tokio::test]
    async fn work_runs_without_being_awaited() {
        let (tx, rx) = oneshot::channel();

        let channel = StoreChannel::spawn("Test.Eager", async move {
            let _ = tx.send(());
            Ok(())
        });

        rx.await.expect("work ran before the channel was awaited");
        assert!(channel.await.is_ok());
    }

    #[tokio::test]
    async fn dropped_channel_does_not_fail_work() {
        let (tx, rx) = oneshot::channel();

        drop(StoreChannel::spawn("Test.Dropped", async move {
            let _ = tx.send(7);
            Ok(())
        }));

        assert_eq!(rx.await, Ok(7));
    }
}
