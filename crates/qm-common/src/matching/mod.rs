pub mod calibration;
pub mod narrative;
pub mod pipeline;
pub mod preference;
pub mod scoring;
pub mod selector;
pub mod weights;

pub use calibration::{CalibrationPolicy, calibrate};
pub use narrative::{
    build_insight, derive_tags, percentage_shares, rank_dimensions, summary_lines, top_dimensions,
};
pub use pipeline::{AnswerSummaryItem, QuizDefinition, QuizOutcome, ScoringEngine, SubtypeFn};
pub use preference::{PreferenceProfile, build_preference};
pub use scoring::{ScoredCandidate, rank_candidates, score, similarity};
pub use selector::select_questions;
pub use weights::ScoringConfig;
