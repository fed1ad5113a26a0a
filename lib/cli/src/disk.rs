//! Resolving a disk name given on the command line to a device identifier.

use std::{
    os::unix::fs::{FileTypeExt, MetadataExt},
    path::{Path, PathBuf},
};

use biopattern_counters::DeviceId;

/// Where device nodes live.
pub const DEFAULT_DEV_DIR: &str = "/dev";

/// Errors from [`resolve()`].
#[derive(Debug, thiserror::Error)]
pub enum DiskError {
    /// There is no device node with that name.
    #[error("no such disk '{name}'")]
    NotFound {
        /// The name that was looked up.
        name: String,
        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
    /// The node exists but isn't a block device.
    #[error("'{}' is not a block device", path.display())]
    NotABlockDevice {
        /// The offending path.
        path: PathBuf,
    },
}

/// Look up `name` (e.g. `sdb` or `nvme0n1p2`) under `dev_dir` and return the
/// identifier the block layer uses for it.
pub fn resolve(name: &str, dev_dir: &Path) -> Result<DeviceId, DiskError> {
    let path = dev_dir.join(name);
    let metadata = std::fs::metadata(&path).map_err(|error| DiskError::NotFound {
        name: name.to_string(),
        error,
    })?;

    if !metadata.file_type().is_block_device() {
        return Err(DiskError::NotABlockDevice { path });
    }

    let rdev = metadata.rdev();
    let dev = DeviceId::new(libc::major(rdev), libc::minor(rdev));
    tracing::debug!(%name, %dev, "resolved disk filter");
    Ok(dev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_disk() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve("sdz", dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "no such disk 'sdz'");
    }

    #[test]
    fn regular_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sdz"), "").unwrap();
        assert!(matches!(
            resolve("sdz", dir.path()),
            Err(DiskError::NotABlockDevice { .. })
        ));
    }

    #[test]
    fn loop_device_resolves() {
        // loop0 is 7,0 wherever the loop driver is present
        if let Ok(dev) = resolve("loop0", Path::new(DEFAULT_DEV_DIR)) {
            assert_eq!(dev, DeviceId::new(7, 0));
        }
    }
}
