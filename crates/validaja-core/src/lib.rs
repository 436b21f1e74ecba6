pub mod classifier;
pub mod document;
pub mod normalize;
pub mod verdict;

pub use classifier::{ClassificationError, DocumentSide, classify};
pub use document::{MIN_REFERENCE_DOCUMENTS, StructuredDocument};
pub use normalize::{NormalizedComparisonRecord, normalize, shape};
pub use verdict::{Finding, IdentityField, Recommendation, Suspicion, VariableField, VerdictResult};
