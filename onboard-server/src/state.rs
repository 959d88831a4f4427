//! Shared application state

use onboard_core::{Board, ClassificationRules};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::error::{ApiError, ApiResult};

/// Handler state
///
/// The board sits behind one lock, so writes are applied one at a time.
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<Mutex<Board>>,
    pub rules: Arc<ClassificationRules>,
}

impl AppState {
    pub fn new(board: Board, rules: ClassificationRules) -> Self {
        Self {
            board: Arc::new(Mutex::new(board)),
            rules: Arc::new(rules),
        }
    }

    /// Run `f` on the blocking pool with the board locked
    ///
    /// Anything that touches the store file goes through here; saves end in
    /// an fsync. The lock is held until `f` returns.
    ///
    /// # Errors
    /// Whatever `f` returns, or `Internal` if the blocking task panicked.
    pub async fn with_board<T, E, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Board) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<ApiError> + Send + 'static,
    {
        let mut board = self.board.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || f(&mut board))
            .await
            .map_err(|e| {
                tracing::error!("Board task failed: {e}");
                ApiError::Internal(format!("board task failed: {e}"))
            })?
            .map_err(Into::into)
    }
}
