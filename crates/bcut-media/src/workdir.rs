//! The scoped working directory.
//!
//! One render owns one workdir. Artifacts are written under stable names
//! (`beats.txt`, `plan.json`, `graph.txt`, `clips/`); on success the
//! directory is removed unless the caller asked to keep it, and on failure
//! it is always preserved for inspection.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::MediaResult;
use crate::graph::{GraphInput, RenderGraph};

/// Scoped working directory for a single render.
#[derive(Debug)]
pub struct Workdir {
    root: PathBuf,
    keep: bool,
    /// Present when the directory is ephemeral (no `--workdir` given);
    /// dropping it removes the tree.
    ephemeral: Option<tempfile::TempDir>,
}

impl Workdir {
    /// Create the workdir. A user-supplied path is created (and kept on
    /// disk afterwards when `keep` is set); otherwise a temp directory is
    /// used.
    pub fn create(path: Option<PathBuf>, keep: bool) -> MediaResult<Self> {
        match path {
            Some(root) => {
                std::fs::create_dir_all(&root)?;
                debug!(root = %root.display(), "using workdir");
                Ok(Self {
                    root,
                    keep,
                    ephemeral: None,
                })
            }
            None => {
                let dir = tempfile::Builder::new().prefix("beatcut-").tempdir()?;
                debug!(root = %dir.path().display(), "using ephemeral workdir");
                Ok(Self {
                    root: dir.path().to_path_buf(),
                    keep,
                    ephemeral: Some(dir),
                })
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn beats_path(&self) -> PathBuf {
        self.root.join("beats.txt")
    }

    pub fn plan_path(&self) -> PathBuf {
        self.root.join("plan.json")
    }

    pub fn graph_path(&self) -> PathBuf {
        self.root.join("graph.txt")
    }

    /// Directory for preprocessed per-image intermediates.
    pub fn clips_dir(&self) -> MediaResult<PathBuf> {
        let dir = self.root.join("clips");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Write prepared beats, one seconds value per line.
    pub fn write_beats(&self, beats: &[f64]) -> MediaResult<PathBuf> {
        let path = self.beats_path();
        let mut text = String::new();
        for b in beats {
            text.push_str(&format!("{b:.6}\n"));
        }
        std::fs::write(&path, text)?;
        Ok(path)
    }

    /// Write the filter graph and any concat list documents; returns the
    /// graph side-file path for `-filter_complex_script`.
    pub fn write_graph(&self, graph: &RenderGraph) -> MediaResult<PathBuf> {
        for input in &graph.inputs {
            if let GraphInput::List {
                file_name,
                contents,
            } = input
            {
                std::fs::write(self.root.join(file_name), contents)?;
            }
        }
        let path = self.graph_path();
        std::fs::write(&path, &graph.filtergraph)?;
        Ok(path)
    }

    /// Resolve a list input file name to its on-disk path.
    pub fn list_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Finish the render. On success the directory is removed unless it is
    /// kept; on failure it always survives.
    pub fn finish(mut self, success: bool) {
        if !success || self.keep {
            if let Some(dir) = self.ephemeral.take() {
                let root = dir.keep();
                info!(workdir = %root.display(), "workdir preserved");
            } else {
                info!(workdir = %self.root.display(), "workdir preserved");
            }
            return;
        }
        if self.ephemeral.take().is_some() {
            // TempDir drop removes the tree.
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            tracing::warn!(workdir = %self.root.display(), "failed to remove workdir: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcut_models::RenderMode;

    #[test]
    fn test_write_beats_format() {
        let work = Workdir::create(None, false).unwrap();
        let path = work.write_beats(&[0.5, 1.234567]).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "0.500000\n1.234567\n");
    }

    #[test]
    fn test_write_graph_and_lists() {
        let work = Workdir::create(None, false).unwrap();
        let graph = RenderGraph {
            mode: RenderMode::HardCut,
            inputs: vec![GraphInput::List {
                file_name: "list.ffconcat".to_string(),
                contents: "ffconcat version 1.0\n".to_string(),
            }],
            filtergraph: "[0:v]null[f0]".to_string(),
            output_label: "f0".to_string(),
            boundaries: vec![],
            total_s: 1.0,
        };
        let graph_path = work.write_graph(&graph).unwrap();
        assert_eq!(
            std::fs::read_to_string(graph_path).unwrap(),
            "[0:v]null[f0]"
        );
        assert!(work.list_path("list.ffconcat").exists());
    }

    #[test]
    fn test_ephemeral_workdir_removed_on_success() {
        let work = Workdir::create(None, false).unwrap();
        let root = work.root().to_path_buf();
        assert!(root.exists());
        work.finish(true);
        assert!(!root.exists());
    }

    #[test]
    fn test_workdir_preserved_on_failure() {
        let work = Workdir::create(None, false).unwrap();
        let root = work.root().to_path_buf();
        work.finish(false);
        assert!(root.exists());
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_named_workdir_kept_when_requested() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("work");
        let work = Workdir::create(Some(root.clone()), true).unwrap();
        work.write_beats(&[1.0]).unwrap();
        work.finish(true);
        assert!(root.join("beats.txt").exists());
    }

    #[test]
    fn test_named_workdir_removed_on_success() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("work");
        let work = Workdir::create(Some(root.clone()), false).unwrap();
        work.finish(true);
        assert!(!root.exists());
    }
}
