pub mod assignment;
pub mod assignment_question;
pub mod assignment_submission;
pub mod grading_unit;
pub mod node_lock;
pub mod question_criterion;
pub mod submission_answer;

pub use assignment::Entity as Assignment;
pub use assignment_question::Entity as AssignmentQuestion;
pub use assignment_submission::Entity as AssignmentSubmission;
pub use grading_unit::Entity as GradingUnit;
pub use node_lock::Entity as NodeLock;
pub use question_criterion::Entity as QuestionCriterion;
pub use submission_answer::Entity as SubmissionAnswer;
