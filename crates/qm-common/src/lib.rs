pub mod api;
pub mod catalog;
pub mod dimension;
pub mod domains;
pub mod enrichment;
pub mod ids;
pub mod logging;
pub mod matching;
pub mod question;

pub use catalog::{CandidateProfile, Catalog, CatalogError, DisplayMeta};
pub use dimension::{Dimension, DimensionMap, DimensionScale};
pub use domains::{Evaluation, EvaluationError, QuizDomain, QuizRegistry, UnknownDomain, registry};
pub use question::{AnswerOption, Question};
