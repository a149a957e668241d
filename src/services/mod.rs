pub mod submission_service;

pub use submission_service::{
    CreateSubmission, RiskMismatch, SubmissionError, SubmissionResult, SubmissionService, TagGroup,
    UpdateSubmission,
};
