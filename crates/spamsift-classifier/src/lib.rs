//! spamsift Classifier
//!
//! The classification serving pipeline: deterministic text normalization,
//! vocabulary-based feature extraction, linear-model inference with
//! confidence scoring, and a fallback-aware artifact loading strategy.
//!
//! The pipeline runs each request through three synchronous stages:
//! normalize → transform → predict. The fitted vectorizer and classifier
//! are deserialized once at startup into an immutable [`ArtifactBundle`]
//! shared read-only across requests; a failed load degrades the pipeline
//! instead of terminating the process.

pub mod inference;
pub mod loader;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod stopwords;
pub mod vectorizer;

pub use inference::predict;
pub use loader::{
    ArtifactBundle, ArtifactCandidate, ArtifactFormat, ArtifactLoader, ArtifactProvenance,
    LoaderConfig,
};
pub use model::{Capability, LinearModel, ModelKind};
pub use normalizer::normalize;
pub use pipeline::{PipelineStatus, ServingState, SpamPipeline};
pub use vectorizer::{FeatureVector, FitOptions, Vectorizer, Weighting};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::inference::predict;
    pub use crate::loader::{ArtifactBundle, ArtifactLoader, LoaderConfig};
    pub use crate::model::{Capability, LinearModel, ModelKind};
    pub use crate::normalizer::normalize;
    pub use crate::pipeline::{SpamPipeline, ServingState};
    pub use crate::vectorizer::{FeatureVector, Vectorizer, Weighting};
    pub use spamsift_core::{Error, Label, PredictionResponse, PredictionResult, Result};
}
