//! Test harness for heft integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub struct TestTree {
    dir: TempDir,
}

#[allow(dead_code)]
impl TestTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file of `size` bytes, creating parent directories as needed.
    /// Synced so the allocated size is observable immediately.
    pub fn add_file(&self, path: &str, size: usize) -> PathBuf {
        use std::io::Write;

        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        let mut file = fs::File::create(&full_path).expect("Failed to create file");
        file.write_all(&vec![b'x'; size]).expect("Failed to write file");
        file.sync_all().expect("Failed to sync file");
        full_path
    }

    /// Create an empty directory, including parents.
    pub fn add_dir(&self, path: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        fs::create_dir_all(&full_path).expect("Failed to create dir");
        full_path
    }
}

#[allow(dead_code)]
pub fn run_heft(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = env!("CARGO_BIN_EXE_heft");
    let output = Command::new(binary)
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run heft");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();

    (stdout, stderr, success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_creates_temp_dir() {
        let tree = TestTree::new();
        assert!(tree.path().exists());
    }

    #[test]
    fn test_harness_add_file_with_size() {
        let tree = TestTree::new();
        let file = tree.add_file("sub/data.bin", 4096);
        assert!(file.exists());
        assert_eq!(fs::metadata(&file).unwrap().len(), 4096);
    }
}
