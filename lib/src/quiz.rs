use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_OPTION_SLOTS: usize = 4;
pub const DEFAULT_POINTS: u32 = 1;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum QuizError {
    #[error("quiz has no questions")]
    EmptyQuiz,
    #[error("question {index} is incomplete: {reason}")]
    IncompleteQuestion {
        index: usize,
        reason: IncompleteReason,
    },
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncompleteReason {
    #[error("blank question text")]
    BlankQuestionText,
    #[error("blank option")]
    BlankOption,
    #[error("no correct option selected")]
    NoCorrectOption,
    #[error("no correct options selected")]
    NoCorrectOptions,
    #[error("blank answer")]
    BlankAnswer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionType {
    Single,
    Multi,
    Paragraph,
}

impl QuestionType {
    // Anything unrecognized is authored as single choice, the editor default.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "multi" => Self::Multi,
            "paragraph" => Self::Paragraph,
            _ => Self::Single,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    Single {
        options: Vec<String>,
        correct_option: Option<usize>,
    },
    Multi {
        options: Vec<String>,
        correct_options: BTreeSet<usize>,
    },
    Paragraph {
        answer: String,
    },
}

impl QuestionKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Single { .. } => "single",
            Self::Multi { .. } => "multi",
            Self::Paragraph { .. } => "paragraph",
        }
    }

    fn check(&self) -> Result<(), IncompleteReason> {
        match self {
            Self::Single {
                options,
                correct_option,
            } => {
                if options.iter().any(|option| option.trim().is_empty()) {
                    return Err(IncompleteReason::BlankOption);
                }

                if correct_option.is_none() {
                    return Err(IncompleteReason::NoCorrectOption);
                }

                Ok(())
            }
            Self::Multi {
                options,
                correct_options,
            } => {
                if options.iter().any(|option| option.trim().is_empty()) {
                    return Err(IncompleteReason::BlankOption);
                }

                if correct_options.is_empty() {
                    return Err(IncompleteReason::NoCorrectOptions);
                }

                Ok(())
            }
            Self::Paragraph { answer } => {
                if answer.trim().is_empty() {
                    return Err(IncompleteReason::BlankAnswer);
                }

                Ok(())
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QuestionData {
    pub id: Uuid,

    pub module_id: Option<Uuid>,
    pub text: String,
    pub image: Option<String>,
    pub points: u32,
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,

    pub hash: String,
}

impl QuestionData {
    pub(crate) fn new(
        id: Uuid,
        text: String,
        image: Option<String>,
        points: u32,
        explanation: Option<String>,
        kind: QuestionKind,
    ) -> Self {
        let points = points.max(1);
        let hash = Self::hash_data(
            id,
            &text,
            image.as_deref(),
            points,
            explanation.as_deref(),
            &kind,
        );

        Self {
            id,
            module_id: None,
            text,
            image,
            points,
            explanation,
            kind,
            hash,
        }
    }

    fn hash_data(
        id: Uuid,
        text: &str,
        image: Option<&str>,
        points: u32,
        explanation: Option<&str>,
        kind: &QuestionKind,
    ) -> String {
        let mut hasher = blake3::Hasher::new();

        hasher.update(id.as_bytes());
        hasher.update(text.as_bytes());
        hasher.update(&points.to_le_bytes());
        hasher.update(kind.type_tag().as_bytes());

        if let Some(image) = image {
            hasher.update(image.as_bytes());
        }

        if let Some(explanation) = explanation {
            hasher.update(explanation.as_bytes());
        }

        match kind {
            QuestionKind::Single {
                options,
                correct_option,
            } => {
                for option in options {
                    hasher.update(option.as_bytes());
                    hasher.update(&[0]);
                }

                if let Some(correct) = correct_option {
                    hasher.update(&correct.to_le_bytes());
                }
            }
            QuestionKind::Multi {
                options,
                correct_options,
            } => {
                for option in options {
                    hasher.update(option.as_bytes());
                    hasher.update(&[0]);
                }

                for correct in correct_options {
                    hasher.update(&correct.to_le_bytes());
                }
            }
            QuestionKind::Paragraph { answer } => {
                hasher.update(answer.as_bytes());
            }
        }

        hasher.finalize().to_string()
    }

    fn check(&self) -> Result<(), IncompleteReason> {
        if self.text.trim().is_empty() {
            return Err(IncompleteReason::BlankQuestionText);
        }

        self.kind.check()
    }

    pub fn toggle_correct(&mut self, option_index: usize) {
        match &mut self.kind {
            QuestionKind::Single { correct_option, .. } => {
                *correct_option = Some(option_index);
            }
            QuestionKind::Multi {
                correct_options, ..
            } => {
                if !correct_options.remove(&option_index) {
                    correct_options.insert(option_index);
                }
            }
            // Paragraph questions carry no option indices.
            QuestionKind::Paragraph { .. } => {}
        }

        self.rehash();
    }

    fn rehash(&mut self) {
        self.hash = Self::hash_data(
            self.id,
            &self.text,
            self.image.as_deref(),
            self.points,
            self.explanation.as_deref(),
            &self.kind,
        );
    }
}

// Validation gates the save: the caller persists the full question list or
// nothing. The first violation, in list order, is reported back verbatim.
pub fn validate_quiz(questions: &[QuestionData]) -> Result<(), QuizError> {
    if questions.is_empty() {
        return Err(QuizError::EmptyQuiz);
    }

    for (index, question) in questions.iter().enumerate() {
        question
            .check()
            .map_err(|reason| QuizError::IncompleteQuestion { index, reason })?;
    }

    Ok(())
}

pub fn new_question(question_type: QuestionType) -> QuestionBuilder {
    QuestionBuilder::new(question_type)
}

pub struct QuestionBuilder {
    text: String,
    image: Option<String>,
    points: u32,
    explanation: Option<String>,
    kind: QuestionKind,
}

impl QuestionBuilder {
    pub fn new(question_type: QuestionType) -> Self {
        let kind = match question_type {
            QuestionType::Single => QuestionKind::Single {
                options: vec![String::new(); DEFAULT_OPTION_SLOTS],
                correct_option: None,
            },
            QuestionType::Multi => QuestionKind::Multi {
                options: vec![String::new(); DEFAULT_OPTION_SLOTS],
                correct_options: BTreeSet::new(),
            },
            QuestionType::Paragraph => QuestionKind::Paragraph {
                answer: String::new(),
            },
        };

        Self {
            text: String::new(),
            image: None,
            points: DEFAULT_POINTS,
            explanation: None,
            kind,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn points(mut self, points: u32) -> Self {
        self.points = points.max(1);
        self
    }

    pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn option(mut self, index: usize, text: impl Into<String>) -> Self {
        if let QuestionKind::Single { options, .. } | QuestionKind::Multi { options, .. } =
            &mut self.kind
        {
            if index >= options.len() {
                options.resize(index + 1, String::new());
            }

            options[index] = text.into();
        }

        self
    }

    pub fn answer(mut self, answer: impl Into<String>) -> Self {
        if let QuestionKind::Paragraph { answer: expected } = &mut self.kind {
            *expected = answer.into();
        }

        self
    }

    pub fn correct(mut self, option_index: usize) -> Self {
        match &mut self.kind {
            QuestionKind::Single { correct_option, .. } => {
                *correct_option = Some(option_index);
            }
            QuestionKind::Multi {
                correct_options, ..
            } => {
                if !correct_options.remove(&option_index) {
                    correct_options.insert(option_index);
                }
            }
            QuestionKind::Paragraph { .. } => {}
        }

        self
    }

    pub fn build(self) -> QuestionData {
        QuestionData::new(
            Uuid::new_v4(),
            self.text,
            self.image,
            self.points,
            self.explanation,
            self.kind,
        )
    }
}
