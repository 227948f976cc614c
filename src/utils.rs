use crate::error::Res;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Res<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Res<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub(crate) async fn deserialize<T>(path: &Path) -> Res<T>
where
    T: DeserializeOwned,
{
    let content = read(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

/// Create a directory and its parents. Succeeds if it already exists.
pub(crate) async fn make_dir(path: impl AsRef<Path>) -> Res<()> {
    let path = path.as_ref();
    match tokio::fs::create_dir_all(path).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e).context(format!("Unable to create directory {}", path.display())),
    }
}

pub(crate) async fn canonicalize(path: impl AsRef<Path>) -> Res<PathBuf> {
    let path = path.as_ref();
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", path.display()))
}

/// Returns the names of the regular files in `dir`, sorted.
pub(crate) async fn file_names(dir: impl AsRef<Path>) -> Res<Vec<String>> {
    let dir = dir.as_ref();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Unable to read directory {}", dir.display()))?;
    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Unable to read an entry of {}", dir.display()))?
    {
        if entry.path().is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_names_sorted_and_files_only() {
        let dir = TempDir::new().unwrap();
        write(dir.path().join("b.csv"), "b").await.unwrap();
        write(dir.path().join("a.csv"), "a").await.unwrap();
        make_dir(dir.path().join("sub")).await.unwrap();
        let names = file_names(dir.path()).await.unwrap();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }

    #[tokio::test]
    async fn test_make_dir_twice() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("x").join("y");
        make_dir(&p).await.unwrap();
        make_dir(&p).await.unwrap();
        assert!(p.is_dir());
    }
}
