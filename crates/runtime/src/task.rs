//! Handles for background work owned by a component.

use std::future::Future;

use futures::FutureExt;
use tokio::task::JoinHandle;

/// A slot for at most one background task whose output a component folds
/// into its state.
///
/// Dropping the handle aborts the task, so output produced after a component
/// is unmounted is discarded.
#[derive(Debug)]
pub struct Pending<T> {
	handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> Default for Pending<T> {
	fn default() -> Self {
		Self::idle()
	}
}

impl<T: Send + 'static> Pending<T> {
	pub fn idle() -> Self {
		Self { handle: None }
	}

	/// Starts `fut`, aborting whatever the slot held before.
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		self.abort();
		self.handle = Some(tokio::spawn(fut));
	}

	pub fn is_running(&self) -> bool {
		self.handle.is_some()
	}

	/// Takes the output if the task has finished. Never blocks.
	pub fn poll_settled(&mut self) -> Option<T> {
		let handle = self.handle.as_mut()?;
		if !handle.is_finished() {
			return None;
		}
		let joined = handle.now_or_never()?;
		self.handle = None;
		joined.ok()
	}

	/// Waits for the task and returns its output. `None` when idle or aborted.
	pub async fn settle(&mut self) -> Option<T> {
		let handle = self.handle.take()?;
		handle.await.ok()
	}

	pub fn abort(&mut self) {
		if let Some(handle) = self.handle.take() {
			handle.abort();
		}
	}
}

impl<T> Drop for Pending<T> {
	fn drop(&mut self) {
		if let Some(handle) = self.handle.take() {
			handle.abort();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_slot_is_idle() {
		let pending: Pending<u8> = Pending::default();
		assert!(!pending.is_running());
	}

	#[tokio::test]
	async fn settle_returns_output() {
		let mut pending = Pending::idle();
		pending.spawn(async { 42 });
		assert!(pending.is_running());
		assert_eq!(pending.settle().await, Some(42));
		assert!(!pending.is_running());
		assert_eq!(pending.settle().await, None);
	}

	#[tokio::test]
	async fn respawn_aborts_previous_task() {
		let (tx, rx) = tokio::sync::oneshot::channel::<()>();
		let mut pending = Pending::idle();
		pending.spawn(async move {
			let _ = rx.await;
			1
		});
		pending.spawn(async { 2 });
		assert_eq!(pending.settle().await, Some(2));
		for _ in 0..10 {
			tokio::task::yield_now().await;
		}
		assert!(tx.is_closed());
	}

	#[tokio::test]
	async fn drop_aborts_task() {
		let (tx, rx) = tokio::sync::oneshot::channel::<()>();
		{
			let mut pending = Pending::idle();
			pending.spawn(async move {
				let _ = rx.await;
			});
		}
		for _ in 0..10 {
			tokio::task::yield_now().await;
		}
		assert!(tx.is_closed());
	}
}
