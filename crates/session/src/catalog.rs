//! Enumerates selectable fragment programs in the shader directory.
//!
//! Indices are assigned per listing and are only meaningful for the menu that
//! printed them. With [`CatalogOrder::Filesystem`] the order is whatever the
//! platform's directory iteration yields, which differs between platforms and
//! even between runs on some filesystems; [`CatalogOrder::Sorted`] orders by
//! file name so indices are reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CatalogError;

/// True when `name` names a file directly inside the shader directory.
pub fn is_bare_file_name(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty()
        && name != "."
        && name != ".."
        && path.file_name().is_some_and(|file| file == path.as_os_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogOrder {
    #[default]
    Sorted,
    Filesystem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub index: usize,
    pub path: PathBuf,
}

impl CatalogEntry {
    /// File name shown in the menu.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ShaderCatalog {
    directory: PathBuf,
    vertex_file: String,
    order: CatalogOrder,
}

impl ShaderCatalog {
    pub fn new(directory: impl Into<PathBuf>, vertex_file: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            vertex_file: vertex_file.into(),
            order: CatalogOrder::default(),
        }
    }

    pub fn with_order(mut self, order: CatalogOrder) -> Self {
        self.order = order;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn vertex_file(&self) -> &str {
        &self.vertex_file
    }

    /// Full path of the fixed vertex-stage source.
    pub fn vertex_path(&self) -> PathBuf {
        self.directory.join(&self.vertex_file)
    }

    /// Lists regular files directly under the directory, minus the vertex source.
    pub fn list(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let io_err = |source: std::io::Error| CatalogError::Io {
            path: self.directory.clone(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.directory).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let file_type = entry.file_type().map_err(io_err)?;
            if !file_type.is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy() == self.vertex_file.as_str() {
                continue;
            }
            paths.push(entry.path());
        }

        if self.order == CatalogOrder::Sorted {
            paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        }

        Ok(paths
            .into_iter()
            .enumerate()
            .map(|(index, path)| CatalogEntry { index, path })
            .collect())
    }

    /// Maps a menu selection back onto its path.
    pub fn resolve(entries: &[CatalogEntry], index: usize) -> Result<PathBuf, CatalogError> {
        entries
            .iter()
            .find(|entry| entry.index == index)
            .map(|entry| entry.path.clone())
            .ok_or(CatalogError::IndexOutOfRange {
                index,
                len: entries.len(),
            })
    }
}
