use crate::attribute::LineAttributor;
use crate::candidate::{Candidate, FileLoader};
use crate::types::{Annotation, sort_annotations};
use crate::validator::SchemaValidator;
use futures::future::join_all;
use tracing::info;

/// A batch of candidates validated together
#[derive(Debug, Clone, Default)]
pub struct Candidates(Vec<Candidate>);

impl Candidates {
    #[cfg(test)]
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self(candidates)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.0.iter()
    }

    /// Load every candidate's contents, returning sorted annotations for the
    /// files that could not be loaded
    pub async fn load_bytes(&mut self, loader: &dyn FileLoader) -> Vec<Annotation> {
        let results = join_all(self.0.iter_mut().map(|c| c.load_bytes(loader))).await;
        let mut annotations: Vec<Annotation> = results.into_iter().flatten().collect();
        sort_annotations(&mut annotations);
        if !annotations.is_empty() {
            info!("{} of {} files failed to load", annotations.len(), self.0.len());
        }
        annotations
    }

    /// Validate every candidate and return all annotations in one sorted list
    pub async fn validate(
        &self,
        validator: &dyn SchemaValidator,
        attributor: &LineAttributor,
    ) -> Vec<Annotation> {
        let results = join_all(self.0.iter().map(|c| c.validate(validator, attributor))).await;
        let mut annotations: Vec<Annotation> = results.into_iter().flatten().collect();
        sort_annotations(&mut annotations);
        annotations
    }
}

impl FromIterator<Candidate> for Candidates {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
