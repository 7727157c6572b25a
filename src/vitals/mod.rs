pub mod normalizer;
pub mod payload;

pub use normalizer::VitalNormalizer;
pub use payload::Payload;
