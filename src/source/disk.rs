//! Disk usage of the filesystem holding one path.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::snapshot::Reading;
use crate::source::traits::probe_blocking;
use crate::source::{MetricSource, SourceContext, SourceError};

/// Capacity figures for a mounted filesystem, in bytes.
///
/// `free` is the space available to unprivileged users, so `used + free` can
/// be less than `total` on filesystems that reserve blocks for root.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskStat {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub used_percent: f64,
}

impl DiskStat {
    /// Build a stat from total, user-available and used bytes.
    pub fn new(total: u64, free: u64, used: u64) -> Self {
        let usable = used.saturating_add(free);
        let used_percent = if usable > 0 {
            used as f64 / usable as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total,
            free,
            used,
            used_percent,
        }
    }
}

/// Query the filesystem containing `path`.
#[cfg(unix)]
fn usage(path: &Path) -> Result<DiskStat, SourceError> {
    use nix::errno::Errno;
    use nix::sys::statvfs::statvfs;

    let stat = statvfs(path).map_err(|errno| match errno {
        Errno::ENOENT | Errno::ENOTDIR => {
            SourceError::NotFound(format!("path {}", path.display()))
        }
        errno => SourceError::Io(errno.into()),
    })?;

    let fragment = stat.fragment_size() as u64;
    let blocks = stat.blocks() as u64;
    let total = blocks * fragment;
    let free = stat.blocks_available() as u64 * fragment;
    let used = blocks.saturating_sub(stat.blocks_free() as u64) * fragment;

    Ok(DiskStat::new(total, free, used))
}

/// Query the disk whose mount point is the longest prefix of `path`.
#[cfg(not(unix))]
fn usage(path: &Path) -> Result<DiskStat, SourceError> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| {
            let (total, free) = (disk.total_space(), disk.available_space());
            DiskStat::new(total, free, total.saturating_sub(free))
        })
        .ok_or_else(|| SourceError::NotFound(format!("path {}", path.display())))
}

/// Disk usage source for the filesystem holding one path (default `/`).
///
/// The path need not be a mount point; any file or directory reports the
/// filesystem it lives on.
#[derive(Debug, Clone)]
pub struct DiskSource {
    path: PathBuf,
}

impl DiskSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl MetricSource for DiskSource {
    fn name(&self) -> &str {
        "disk"
    }

    async fn fetch(&self, ctx: &SourceContext) -> Result<Reading, SourceError> {
        let path = self.path.clone();
        let stat = probe_blocking(ctx, move || usage(&path)).await?;
        Ok(Reading::Disk(stat))
    }
}
