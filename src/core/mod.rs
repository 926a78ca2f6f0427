pub mod ear;
pub mod grading;
pub mod result;
pub mod seeker;
