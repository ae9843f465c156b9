//! Frame-pair lookup from a CSV manifest.
//!
//! Columns: `treatment, sampleid, date, parameter, frame, filename`.
//! Relative filenames resolve against the manifest's directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PsiiError, Result};
use crate::frame::{FrameKind, FramePair, GroupKey, Parameter, SampleDay};
use crate::pipeline::SampleDayGroup;

use super::image_io::load_frame;

/// Supplies the two frames of a measurement by group key.
pub trait FramePairProvider: Send + Sync {
    fn frame_pair(&self, key: &GroupKey) -> Result<FramePair>;
}

#[derive(Debug, Deserialize)]
struct ManifestRecord {
    treatment: String,
    #[serde(rename = "sampleid")]
    sample: String,
    #[serde(rename = "date")]
    day: String,
    parameter: String,
    frame: FrameKind,
    filename: PathBuf,
}

#[derive(Clone, Debug, Default)]
struct PairFiles {
    dark: Option<PathBuf>,
    bright: Option<PathBuf>,
}

/// Frame files of every measurement, grouped by tray session.
#[derive(Clone, Debug)]
pub struct Manifest {
    groups: Vec<SampleDayGroup>,
    files: HashMap<GroupKey, (PathBuf, PathBuf)>,
}

/// Absorptivity and far-red measurements carry no fluorescence pair.
fn is_excluded(parameter: &str) -> bool {
    parameter.contains("Abs") || parameter.contains("FRon")
}

impl Manifest {
    /// Read and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut records = Vec::new();
        for record in reader.deserialize() {
            let record: ManifestRecord = record?;
            records.push(record);
        }

        let manifest = Self::from_records(records, &base_dir)?;
        info!(
            sessions = manifest.groups.len(),
            measurements = manifest.files.len(),
            "Loaded manifest"
        );
        Ok(manifest)
    }

    fn from_records(records: Vec<ManifestRecord>, base_dir: &Path) -> Result<Self> {
        let mut groups: Vec<SampleDayGroup> = Vec::new();
        let mut group_index: HashMap<SampleDay, usize> = HashMap::new();
        let mut slots: HashMap<GroupKey, PairFiles> = HashMap::new();
        let mut skipped = 0usize;

        for record in records {
            if is_excluded(&record.parameter) {
                skipped += 1;
                continue;
            }
            let parameter: Parameter = record.parameter.parse()?;
            // The FvFm export repeats its light-adapted frames; only Fo/Fm belong to it.
            if parameter.is_baseline() && !matches!(record.frame, FrameKind::Fo | FrameKind::Fm) {
                skipped += 1;
                continue;
            }

            let key = GroupKey {
                treatment: record.treatment,
                sample: record.sample,
                day: record.day,
                parameter,
            };

            // Baselines are shared per (sample, day), so a session has one treatment.
            let idx = *group_index.entry(key.sample_day()).or_insert_with(|| {
                groups.push(SampleDayGroup {
                    treatment: key.treatment.clone(),
                    sample_day: key.sample_day(),
                    parameters: Vec::new(),
                });
                groups.len() - 1
            });
            if groups[idx].treatment != key.treatment {
                return Err(PsiiError::ConflictingTreatment {
                    sample: key.sample,
                    day: key.day,
                    first: groups[idx].treatment.clone(),
                    second: key.treatment,
                });
            }
            if !groups[idx].parameters.contains(&key.parameter) {
                groups[idx].parameters.push(key.parameter.clone());
            }

            let filename = if record.filename.is_absolute() {
                record.filename
            } else {
                base_dir.join(record.filename)
            };
            let slot = slots.entry(key.clone()).or_default();
            let target = if record.frame.is_dark() {
                &mut slot.dark
            } else {
                &mut slot.bright
            };
            if target.is_some() {
                return Err(PsiiError::DuplicateFrame {
                    group: key.to_string(),
                    frame: record.frame.to_string(),
                });
            }
            *target = Some(filename);
        }

        let mut files = HashMap::with_capacity(slots.len());
        for (key, slot) in slots {
            match (slot.dark, slot.bright) {
                (Some(dark), Some(bright)) => {
                    files.insert(key, (dark, bright));
                }
                (None, _) => {
                    return Err(PsiiError::IncompleteFramePair {
                        group: key.to_string(),
                        missing: "dark".into(),
                    })
                }
                (_, None) => {
                    return Err(PsiiError::IncompleteFramePair {
                        group: key.to_string(),
                        missing: "bright".into(),
                    })
                }
            }
        }

        for group in &mut groups {
            // Stable: FvFm first, induction labels keep manifest order.
            group.parameters.sort_by_key(|p| !p.is_baseline());
        }
        groups.sort_by(|a, b| {
            (&a.treatment, &a.sample_day.day, &a.sample_day.sample).cmp(&(
                &b.treatment,
                &b.sample_day.day,
                &b.sample_day.sample,
            ))
        });

        debug!(skipped, "Skipped manifest rows without a fluorescence pair");
        Ok(Self { groups, files })
    }

    /// Tray sessions in processing order.
    pub fn groups(&self) -> &[SampleDayGroup] {
        &self.groups
    }

    /// (dark, bright) files of a measurement.
    pub fn files(&self, key: &GroupKey) -> Option<(&Path, &Path)> {
        self.files
            .get(key)
            .map(|(dark, bright)| (dark.as_path(), bright.as_path()))
    }
}

impl FramePairProvider for Manifest {
    fn frame_pair(&self, key: &GroupKey) -> Result<FramePair> {
        let (dark, bright) = self.files(key).ok_or_else(|| PsiiError::IncompleteFramePair {
            group: key.to_string(),
            missing: "dark and bright".into(),
        })?;
        FramePair::new(key.parameter.clone(), load_frame(dark)?, load_frame(bright)?)
    }
}
