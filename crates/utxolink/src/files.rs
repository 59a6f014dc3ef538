//! Snapshot file I/O.

use std::path::Path;

use eyre::WrapErr;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub async fn read_json<T: DeserializeOwned>(path: &Path) -> eyre::Result<T> {
    let raw = tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&raw).wrap_err_with(|| format!("parse {}", path.display()))
}

/// Pretty-print `value` to `path`, going through a sibling temp file so an
/// interrupted write never truncates an existing snapshot.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> eyre::Result<()> {
    let mut body = serde_json::to_vec_pretty(value).wrap_err("serialize snapshot")?;
    body.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .wrap_err_with(|| format!("create {}", parent.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, &body)
        .await
        .wrap_err_with(|| format!("write {}", Path::new(&tmp).display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .wrap_err_with(|| format!("replace {}", path.display()))
}
