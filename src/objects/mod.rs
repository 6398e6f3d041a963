use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Default base directory for stored objects
const DEFAULT_OBJECT_DIR: &str = "/tmp/quotrak/objects";

/// Objects live in a per-user namespace: `<base>/<user>/<object>.bin`.
/// Reads always go through the owner's namespace, so one user can never
/// address another user's objects.
pub fn object_path(base_dir: &Path, user_id: Uuid, object_id: Uuid) -> PathBuf {
    base_dir
        .join(user_id.as_simple().to_string())
        .join(format!("{}.bin", object_id.as_simple()))
}

/// Writes object bytes, creating the namespace directory if needed
pub async fn store_object(
    base_dir: &Path,
    user_id: Uuid,
    object_id: Uuid,
    data: &[u8],
) -> AppResult<PathBuf> {
    let path = object_path(base_dir, user_id, object_id);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create object directory: {}", e)))?;
    }

    fs::write(&path, data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to write object file: {}", e)))?;

    Ok(path)
}

/// Reads an object from the owner's namespace
pub async fn read_object(base_dir: &Path, user_id: Uuid, object_id: Uuid) -> AppResult<Vec<u8>> {
    let path = object_path(base_dir, user_id, object_id);

    match fs::read(&path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound(format!("Object {} not found", object_id)))
        }
        Err(e) => Err(AppError::Internal(format!(
            "Failed to read object file: {}",
            e
        ))),
    }
}

/// Removes an object. Used to compensate when recording usage for a written
/// object fails; a missing file is not an error.
pub async fn delete_object(base_dir: &Path, user_id: Uuid, object_id: Uuid) -> AppResult<()> {
    let path = object_path(base_dir, user_id, object_id);
    let _ = fs::remove_file(&path).await;
    Ok(())
}

/// Gets the object directory from config or uses default
pub fn object_dir(configured_dir: Option<&str>) -> PathBuf {
    configured_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OBJECT_DIR))
}
