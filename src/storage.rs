use crate::errors::AppError;
use crate::models::AppData;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error};

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file {}: {err}", path.display());
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            AppData::default()
        }
    }
}

/// Writes through a sibling temp file so a crash mid-write never leaves a
/// truncated document behind.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    debug!(goals = data.goals.len(), users = data.users.len(), "persisted data file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("goal_tracker_{name}_{}_{nanos}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let data = load_data(&temp_path("missing")).await;
        assert!(data.users.is_empty());
        assert!(data.goals.is_empty());
    }

    #[tokio::test]
    async fn persisted_data_loads_back() {
        let path = temp_path("persist");
        let mut data = AppData::default();
        let user_id = data.insert_user("ana".into(), "ana@example.com".into(), "hash".into());
        data.insert_goal(user_id, "Run".into(), vec!["Buy shoes".into(), "5k".into()]);

        persist_data(&path, &data).await.unwrap();
        let loaded = load_data(&path).await;
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.users.len(), 1);
        let goal = loaded.goals.values().next().unwrap();
        assert_eq!(goal.tasks.len(), 2);
        assert_eq!(loaded.next_task_id, 2);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let path = temp_path("corrupt");
        std::fs::write(&path, b"{not json").unwrap();
        let data = load_data(&path).await;
        let _ = std::fs::remove_file(&path);
        assert!(data.goals.is_empty());
    }
}
