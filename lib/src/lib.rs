pub mod data;
pub mod duration;
pub mod helpers;
pub mod quiz;
pub mod raw_data;
pub mod sync;

pub use data::{
    toggle_expansion, CourseData, ExpansionSet, ModuleData, ModuleKind, SectionData,
    SubSectionData,
};
pub use quiz::{
    new_question, validate_quiz, IncompleteReason, QuestionBuilder, QuestionData, QuestionKind,
    QuestionType, QuizError,
};
pub use sync::{SyncData, SyncMetadata};
