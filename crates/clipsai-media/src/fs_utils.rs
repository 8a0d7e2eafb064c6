//! File moves, verbatim copies and partial-output cleanup.

use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Move `src` to `dst`, falling back to copy + delete across filesystems.
///
/// Scratch and download directories may be different mounts, so a plain
/// rename can fail with `EXDEV`.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    ensure_parent(dst).await?;

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                src = %src.display(),
                dst = %dst.display(),
                "Cross-device rename, copying instead"
            );
            copy_file(src, dst).await?;
            if let Err(e) = fs::remove_file(src).await {
                warn!(src = %src.display(), error = %e, "Failed to remove source after copy");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Byte-for-byte copy of `src` to `dst`.
///
/// Written to a sibling `.part` file first so `dst` never holds a half copy.
pub async fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<u64> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    ensure_parent(dst).await?;

    let part = dst.with_extension("part");
    let copied = match fs::copy(src, &part).await {
        Ok(n) => n,
        Err(e) => {
            remove_partial_output(&part).await;
            return Err(e.into());
        }
    };

    if let Err(e) = fs::rename(&part, dst).await {
        remove_partial_output(&part).await;
        return Err(e.into());
    }

    Ok(copied)
}

/// Best-effort removal of an output left behind by a failed operation.
///
/// Returns whether a file was actually removed.
pub async fn remove_partial_output(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed partial output");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove partial output");
            false
        }
    }
}

async fn ensure_parent(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// EXDEV is error code 18 on Linux/macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}
