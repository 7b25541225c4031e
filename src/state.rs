use crate::errors::AppError;
use crate::models::AppData;
use crate::storage::persist_data;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{Mutex, MutexGuard};

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn read(&self) -> MutexGuard<'_, AppData> {
        self.data.lock().await
    }

    /// Runs `apply` under the data lock and persists the document before the
    /// lock is released. Nothing is written when `apply` fails.
    pub async fn mutate<T, E>(
        &self,
        apply: impl FnOnce(&mut AppData) -> Result<T, E>,
    ) -> Result<Result<T, E>, AppError> {
        let mut data = self.data.lock().await;
        match apply(&mut data) {
            Ok(value) => {
                persist_data(&self.data_path, &data).await?;
                Ok(Ok(value))
            }
            Err(err) => Ok(Err(err)),
        }
    }
}
