#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const DATASET_FILES: &[&str] = &[
    "clientes.csv",
    "productos.csv",
    "ventas.csv",
    "detalle_ventas.csv",
];

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Copies the sample store dataset into `<workspace>/data` and returns
    /// that directory. The product cache will be written there too.
    pub fn with_sample_dataset(&self) -> PathBuf {
        let data_dir = self.temp_dir.path().join("data");
        fs::create_dir_all(&data_dir).expect("create data dir");
        for name in DATASET_FILES {
            fs::copy(fixture_path(&format!("tienda/{name}")), data_dir.join(name))
                .expect("copy fixture");
        }
        data_dir
    }
}

/// Config pointing at `data_dir` with everything else at defaults.
pub fn config_for(data_dir: &Path) -> tienda_analytics::config::AnalyticsConfig {
    tienda_analytics::config::AnalyticsConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}
