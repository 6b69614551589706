//! Bridges completion callbacks into awaitable results.
//!
//! OS media APIs report start and stop completion through a callback invoked
//! on some background thread. [`await_completion`] hands such an API a
//! [`CompletionHandler`] and suspends until it fires.

use tokio::sync::oneshot;

use crate::RecorderError;

/// One-shot completion callback.
///
/// Completing consumes the handler, so it fires at most once. Dropping it
/// without completing resolves the waiting side with an error.
#[derive(Debug)]
pub struct CompletionHandler<T> {
    tx: oneshot::Sender<Result<T, RecorderError>>,
}

impl<T> CompletionHandler<T> {
    /// Reports the outcome.
    pub fn complete(self, result: Result<T, RecorderError>) {
        // The waiter may have been cancelled; nothing to report to.
        let _ = self.tx.send(result);
    }

    /// Reports success.
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Reports failure.
    pub fn fail(self, error: RecorderError) {
        self.complete(Err(error));
    }
}

/// Calls `register` with a fresh handler and waits for it to complete.
///
/// `context` names the operation in the error produced if the handler is
/// dropped without completing.
///
/// # Example
///
/// ```
/// use app_audio_recorder::capture::await_completion;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let value = await_completion("start capture", |handler| {
///     std::thread::spawn(move || handler.succeed(7));
/// })
/// .await
/// .unwrap();
/// assert_eq!(value, 7);
/// # }
/// ```
pub async fn await_completion<T, F>(context: &str, register: F) -> Result<T, RecorderError>
where
    F: FnOnce(CompletionHandler<T>),
{
    let (tx, rx) = oneshot::channel();
    register(CompletionHandler { tx });
    match rx.await {
        Ok(result) => result,
        Err(_) => Err(RecorderError::subsystem(
            context,
            "completion handler dropped without reporting",
        )),
    }
}
