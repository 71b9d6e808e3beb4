pub mod quiz_request;
pub mod quiz_response;

pub use quiz_request::{QuestionQuery, QuizRequest};
pub use quiz_response::{
    AnswerSummaryDto, CandidateDto, EnrichmentStatus, OptionDto, QuestionDto, QuestionSetResponse,
    QuizListResponse, QuizResultDto, QuizResultResponse, QuizSummaryDto, ShareDto,
};
