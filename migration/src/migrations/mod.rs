pub mod m202510010001_create_assignments;
pub mod m202510010002_create_assignment_questions;
pub mod m202510010003_create_question_criteria;
pub mod m202510010004_create_assignment_submissions;
pub mod m202510010005_create_submission_answers;
pub mod m202510010006_create_grading_units;
pub mod m202510010007_create_node_locks;
