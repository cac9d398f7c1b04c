use crate::error::{AppError, AppResult, FileError};
use crate::models::client_state::ClientState;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载答案并转换为 ClientState
///
/// 文件顶层的每个键是元素标识，值是该元素的答案。
pub async fn load_toml_to_client_state(toml_file_path: &Path) -> AppResult<ClientState> {
    let path = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&path, e))?;

    let state: ClientState = toml::from_str(&content)
        .map_err(|source| FileError::TomlParseFailed { path, source })?;

    Ok(state)
}

/// 从文件夹中加载所有 TOML 答案文件，按文件名排序
pub async fn load_all_toml_files(folder_path: &str) -> AppResult<Vec<(String, ClientState)>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut answer_files = Vec::new();
    for path in toml_files {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        tracing::info!("正在加载: {}", name);

        match load_toml_to_client_state(&path).await {
            Ok(state) => {
                tracing::info!("成功加载 {} 个元素答案", state.len());
                answer_files.push((name, state));
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(answer_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn loads_sorted_files_and_skips_broken_ones() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.toml"), "q2 = \"second\"\n").unwrap();
        std::fs::write(
            dir.path().join("a.toml"),
            "q1 = 42\n[q3]\nchoice = [1, 2]\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.toml"), "q1 = \n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = load_all_toml_files(dir.path().to_str().unwrap())
            .await
            .unwrap();

        let names: Vec<_> = files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a.toml", "b.toml"]);
        assert_eq!(files[0].1.get("q1"), Some(&json!(42)));
        assert_eq!(files[0].1.get("q3"), Some(&json!({"choice": [1, 2]})));
    }

    #[tokio::test]
    async fn missing_folder_is_an_error() {
        let result = load_all_toml_files("/definitely/not/here").await;
        assert!(matches!(
            result,
            Err(AppError::File(FileError::DirectoryNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn unreadable_folder_error_names_the_folder() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("answers.toml");
        std::fs::write(&not_a_dir, "q1 = 1\n").unwrap();
        let folder = not_a_dir.to_str().unwrap();

        let err = load_all_toml_files(folder).await.unwrap_err();
        match err {
            AppError::File(FileError::ReadFailed { path, .. }) => assert_eq!(path, folder),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
