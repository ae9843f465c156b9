use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{PsiiError, Result};
use crate::frame::{Frame, Mask, SampleDay};

/// What later measurements of a session need from its FvFm measurement.
#[derive(Clone, Debug)]
pub struct Baseline {
    /// Union of every per-ROI plant mask of the baseline measurement.
    pub mask: Mask,
    /// Dark-adapted maximum fluorescence (Fm), the NPQ reference.
    pub bright: Frame,
}

/// Baselines keyed by (sample, day). Written once per session, then read
/// by every induction measurement of that session.
#[derive(Debug, Default)]
pub struct BaselineStore {
    inner: RwLock<HashMap<SampleDay, Arc<Baseline>>>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: SampleDay, baseline: Baseline) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::new(baseline));
    }

    /// The baseline of a session; `MissingBaseline` if FvFm was not processed.
    pub fn get(&self, key: &SampleDay) -> Result<Arc<Baseline>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| PsiiError::MissingBaseline {
                sample: key.sample.clone(),
                day: key.day.clone(),
            })
    }

    pub fn contains(&self, key: &SampleDay) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
