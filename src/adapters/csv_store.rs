//! File-backed data log store.
//!
//! Implements [`LogStoragePort`] over `std::fs`.  On the device the file
//! lives on a SPIFFS partition mounted into the VFS by [`mount`]; on the
//! host it is a plain file.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::app::ports::{LogStoragePort, StorageError};

/// Append-only CSV file.
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("CsvFileStore: {}", path.display());
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogStoragePort for CsvFileStore {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn append(&mut self, text: &str) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(map_io)?;
        file.write_all(text.as_bytes()).map_err(map_io)?;
        file.flush().map_err(map_io)?;
        debug!("CsvFileStore: appended {} bytes", text.len());
        Ok(())
    }
}

fn map_io(e: std::io::Error) -> StorageError {
    match e.kind() {
        // Missing directory: the partition is not mounted.
        ErrorKind::NotFound => StorageError::NotMounted,
        _ if e.raw_os_error() == Some(ENOSPC) => StorageError::Full,
        _ => StorageError::IoError,
    }
}

const ENOSPC: i32 = 28;

/// Register the `storage` SPIFFS partition at `base_path`, formatting it
/// if it cannot be mounted.
#[cfg(target_os = "espidf")]
pub fn mount(base_path: &str) -> Result<(), StorageError> {
    use esp_idf_svc::sys::*;

    let base = std::ffi::CString::new(base_path).map_err(|_| StorageError::NotMounted)?;
    let conf = esp_vfs_spiffs_conf_t {
        base_path: base.as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: `conf` and the path it points to outlive the call; the VFS
    // copies the base path.
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK {
        log::error!("CsvFileStore: SPIFFS mount at {} failed ({})", base_path, ret);
        return Err(StorageError::NotMounted);
    }
    info!("CsvFileStore: SPIFFS mounted at {}", base_path);
    Ok(())
}
