pub mod organization;
pub mod submission;
pub mod user;

pub use organization::Organization;
pub use submission::{NewSubmission, Submission, SubmissionData, SubmissionListing};
pub use user::{NewUser, User};
