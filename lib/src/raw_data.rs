use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::{CourseData, ModuleData, SectionData, SubSectionData};
use crate::quiz::{QuestionData, QuestionKind, QuestionType, DEFAULT_POINTS};

// The raw layer mirrors the authored JSON files, which keep the camelCase
// conventions of the original authoring app. Everything optional here is
// defaulted during normalization; parsing itself stays lenient.

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawCourseData {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_restrictions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_devices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_access_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sections: Vec<RawSectionData>,
}

impl From<CourseData> for RawCourseData {
    fn from(data: CourseData) -> Self {
        Self {
            title: data.title,
            description: Some(data.description),
            category: Some(data.category),
            access_code: data.access_code,
            thumbnail: data.thumbnail,
            device_restrictions: Some(data.device_restrictions),
            max_devices: Some(data.max_devices),
            guest_access_enabled: Some(data.guest_access_enabled),
            updated_at: data.updated_at,
            sections: data.sections.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RawSectionData {
    pub id: Option<Uuid>,

    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: Option<i64>,
    #[serde(default)]
    pub modules: Vec<RawModuleData>,
    #[serde(default)]
    pub sub_sections: Vec<RawSubSectionData>,
}

impl From<SectionData> for RawSectionData {
    fn from(data: SectionData) -> Self {
        Self {
            id: Some(data.id),
            title: data.title,
            description: data.description,
            order: Some(data.order),
            modules: data.modules.into_iter().map(Into::into).collect(),
            sub_sections: data.sub_sections.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RawSubSectionData {
    pub id: Option<Uuid>,

    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub modules: Vec<RawModuleData>,
}

impl From<SubSectionData> for RawSubSectionData {
    fn from(data: SubSectionData) -> Self {
        Self {
            id: Some(data.id),
            title: data.title,
            description: data.description,
            content: data.content,
            duration: Some(format!("{} min", data.duration_minutes)),
            modules: data.modules.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RawModuleData {
    pub id: Option<Uuid>,

    pub title: String,
    #[serde(rename = "type")]
    pub module_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub duration: Option<String>,
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<RawQuestionData>,
}

impl From<ModuleData> for RawModuleData {
    fn from(data: ModuleData) -> Self {
        Self {
            id: Some(data.id),
            title: data.title,
            module_type: Some(data.kind.as_str().to_owned()),
            content: data.content,
            duration: Some(format!("{} min", data.duration_minutes)),
            order: Some(data.order),
            questions: data.questions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestionData {
    pub id: Option<Uuid>,

    #[serde(rename = "type")]
    pub question_type: Option<String>,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_image: Option<String>,
    pub points: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correct_options: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl From<RawQuestionData> for QuestionData {
    fn from(raw: RawQuestionData) -> Self {
        let question_type = raw
            .question_type
            .as_deref()
            .map(QuestionType::from_tag)
            .unwrap_or(QuestionType::Single);

        let kind = match question_type {
            QuestionType::Single => QuestionKind::Single {
                options: raw.options,
                correct_option: raw.correct_option,
            },
            QuestionType::Multi => QuestionKind::Multi {
                options: raw.options,
                // Collecting into a set drops duplicate indices.
                correct_options: raw.correct_options.into_iter().collect(),
            },
            QuestionType::Paragraph => QuestionKind::Paragraph {
                answer: raw.answer.unwrap_or_default(),
            },
        };

        Self::new(
            raw.id.unwrap_or_else(Uuid::new_v4),
            raw.question,
            raw.question_image,
            raw.points.unwrap_or(DEFAULT_POINTS),
            raw.explanation,
            kind,
        )
    }
}

impl From<QuestionData> for RawQuestionData {
    fn from(data: QuestionData) -> Self {
        let type_tag = data.kind.type_tag().to_owned();

        let (options, correct_option, correct_options, answer) = match data.kind {
            QuestionKind::Single {
                options,
                correct_option,
            } => (options, correct_option, Vec::new(), None),
            QuestionKind::Multi {
                options,
                correct_options,
            } => (
                options,
                None,
                correct_options.into_iter().collect(),
                None,
            ),
            QuestionKind::Paragraph { answer } => (Vec::new(), None, Vec::new(), Some(answer)),
        };

        Self {
            id: Some(data.id),
            question_type: Some(type_tag),
            question: data.text,
            question_image: data.image,
            points: Some(data.points),
            explanation: data.explanation,
            options,
            correct_option,
            correct_options,
            answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::IncompleteReason;

    #[test]
    fn authored_camel_case_fields_parse() {
        let raw: RawCourseData = serde_json::from_str(
            r#"{
                "title": "Camels",
                "accessCode": "abc123",
                "deviceRestrictions": false,
                "maxDevices": 5,
                "guestAccessEnabled": true,
                "sections": [
                    {
                        "title": "Only",
                        "subSections": [{"title": "Inner", "duration": "30 min"}]
                    }
                ]
            }"#,
        )
        .unwrap();

        let course = CourseData::new("camels".to_owned(), raw);

        assert_eq!(course.access_code.as_deref(), Some("abc123"));
        assert!(!course.device_restrictions);
        assert_eq!(course.max_devices, 5);
        assert!(course.guest_access_enabled);
        assert_eq!(course.sections[0].sub_sections[0].duration_minutes, 30);
    }

    #[test]
    fn unknown_course_fields_are_rejected() {
        let result = serde_json::from_str::<RawCourseData>(r#"{"title": "x", "colour": "red"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn question_variants_split_by_discriminator() {
        let raw: RawQuestionData = serde_json::from_str(
            r#"{
                "type": "multi",
                "question": "Pick the even numbers",
                "options": ["1", "2", "3", "4"],
                "correctOptions": [1, 3, 3]
            }"#,
        )
        .unwrap();

        let question = QuestionData::from(raw);

        match &question.kind {
            QuestionKind::Multi {
                correct_options, ..
            } => {
                assert_eq!(
                    correct_options.iter().copied().collect::<Vec<_>>(),
                    vec![1, 3]
                );
            }
            kind => panic!("unexpected kind {kind:?}"),
        }
        assert_eq!(question.points, DEFAULT_POINTS);
    }

    #[test]
    fn paragraph_question_keeps_only_its_answer() {
        let raw: RawQuestionData = serde_json::from_str(
            r#"{
                "type": "paragraph",
                "question": "Name the capital of France",
                "answer": "Paris",
                "points": 3
            }"#,
        )
        .unwrap();

        let question = QuestionData::from(raw);

        assert_eq!(question.points, 3);
        assert_eq!(
            question.kind,
            QuestionKind::Paragraph {
                answer: "Paris".to_owned()
            }
        );

        let written = RawQuestionData::from(question);
        assert!(written.options.is_empty());
        assert_eq!(written.correct_option, None);
        assert_eq!(written.answer.as_deref(), Some("Paris"));
    }

    #[test]
    fn formatted_write_back_materializes_defaults() {
        let raw: RawCourseData = serde_json::from_str(
            r#"{
                "title": "Round trip",
                "sections": [
                    {
                        "title": "Only",
                        "modules": [{"title": "Talk", "type": "video", "duration": "25 minutes"}]
                    }
                ]
            }"#,
        )
        .unwrap();

        let course = CourseData::new("round-trip".to_owned(), raw);
        let written = RawCourseData::from(course);

        assert!(written.description.is_some());
        assert_eq!(written.device_restrictions, Some(true));
        assert!(written.sections[0].id.is_some());
        assert_eq!(written.sections[0].order, Some(0));
        assert_eq!(
            written.sections[0].modules[0].duration.as_deref(),
            Some("25 min")
        );
    }

    #[test]
    fn incomplete_raw_question_surfaces_through_validation() {
        let raw: RawQuestionData =
            serde_json::from_str(r#"{"question": "Pick one", "options": ["a", "b"]}"#).unwrap();

        let question = QuestionData::from(raw);

        assert_eq!(
            crate::quiz::validate_quiz(&[question]),
            Err(crate::quiz::QuizError::IncompleteQuestion {
                index: 0,
                reason: IncompleteReason::NoCorrectOption,
            })
        );
    }
}
