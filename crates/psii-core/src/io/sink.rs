use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::frame::{Frame, GroupKey, Mask, RatioImage};

use super::image_io::{save_frame_tiff, save_mask_png, save_ratio_tiff};

/// Something the pipeline persists for one measurement.
#[derive(Clone, Copy, Debug)]
pub enum Artifact<'a> {
    /// Union of every per-ROI plant mask of the FvFm measurement.
    BaselineMask(&'a Mask),
    /// Baseline maximum fluorescence, reference for NPQ.
    Fmax(&'a Frame),
    FvFm(&'a RatioImage),
    Yii(&'a RatioImage),
    Npq(&'a RatioImage),
}

impl Artifact<'_> {
    /// File suffix, also used as the artifact's name.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::BaselineMask(_) => "mask",
            Self::Fmax(_) => "fmax",
            Self::FvFm(_) => "fvfm",
            Self::Yii(_) => "yii",
            Self::Npq(_) => "npq",
        }
    }
}

/// Destination of per-measurement artifacts. Implementations must accept
/// concurrent writes for distinct group keys.
pub trait OutputSink: Send + Sync {
    fn persist(&self, key: &GroupKey, artifact: Artifact<'_>) -> Result<()>;
}

/// Writes artifacts below an output directory:
/// `masks/<stem>_mask.png` and `fluorescence/<sample>/<stem>_<suffix>.tif`.
#[derive(Clone, Debug)]
pub struct FsSink {
    root: PathBuf,
    write_images: bool,
}

impl FsSink {
    /// Create the sink and its directory layout. With `write_images` off only
    /// baseline masks are written.
    pub fn new(root: impl Into<PathBuf>, write_images: bool) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("masks"))?;
        fs::create_dir_all(root.join("fluorescence"))?;
        Ok(Self { root, write_images })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mask_path(&self, key: &GroupKey) -> PathBuf {
        self.root
            .join("masks")
            .join(format!("{}_mask.png", key.file_stem()))
    }

    pub fn image_path(&self, key: &GroupKey, suffix: &str) -> PathBuf {
        self.root
            .join("fluorescence")
            .join(&key.sample)
            .join(format!("{}_{}.tif", key.file_stem(), suffix))
    }
}

impl OutputSink for FsSink {
    fn persist(&self, key: &GroupKey, artifact: Artifact<'_>) -> Result<()> {
        if let Artifact::BaselineMask(mask) = artifact {
            let path = self.mask_path(key);
            debug!(path = %path.display(), "Writing baseline mask");
            return save_mask_png(mask, &path);
        }
        if !self.write_images {
            return Ok(());
        }

        let path = self.image_path(key, artifact.suffix());
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        debug!(path = %path.display(), "Writing fluorescence image");
        match artifact {
            Artifact::Fmax(frame) => save_frame_tiff(frame, &path),
            Artifact::FvFm(img) | Artifact::Yii(img) | Artifact::Npq(img) => {
                save_ratio_tiff(img, &path)
            }
            Artifact::BaselineMask(_) => Ok(()),
        }
    }
}

/// Keeps artifact names and baseline masks in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    written: Mutex<Vec<(String, &'static str)>>,
    masks: Mutex<HashMap<String, Mask>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// (file stem, artifact suffix) of everything persisted so far, sorted.
    pub fn written(&self) -> Vec<(String, &'static str)> {
        let mut written = self
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        written.sort();
        written
    }

    /// Baseline mask persisted for a group, if any.
    pub fn mask(&self, key: &GroupKey) -> Option<Mask> {
        self.masks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key.file_stem())
            .cloned()
    }
}

impl OutputSink for MemorySink {
    fn persist(&self, key: &GroupKey, artifact: Artifact<'_>) -> Result<()> {
        if let Artifact::BaselineMask(mask) = artifact {
            self.masks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.file_stem(), mask.clone());
        }
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((key.file_stem(), artifact.suffix()));
        Ok(())
    }
}
