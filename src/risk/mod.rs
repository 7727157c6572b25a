pub mod collaborators;
pub mod message;
pub mod pipeline;

pub use collaborators::{
    AdviceGenerator, AdviceRequest, GuidelineAdvisor, RiskClassifier, ScoringClassifier,
};
pub use pipeline::{PipelineOutcome, RiskPipeline};
