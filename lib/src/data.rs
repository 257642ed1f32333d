use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::duration;
use crate::helpers::write_data;
use crate::quiz::{validate_quiz, QuestionData};
use crate::raw_data::{RawCourseData, RawModuleData, RawSectionData, RawSubSectionData};

pub const DEFAULT_DESCRIPTION: &str = "No description provided yet.";
pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_MAX_DEVICES: u32 = 2;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CourseData {
    pub key: String,

    pub title: String,
    pub description: String,
    pub category: String,
    pub access_code: Option<String>,
    pub thumbnail: Option<String>,
    pub device_restrictions: bool,
    pub max_devices: u32,
    pub guest_access_enabled: bool,
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub sections: Vec<SectionData>,

    pub total_sections: usize,
    pub total_sub_sections: usize,
    pub total_modules: usize,
    pub total_duration_minutes: u64,

    pub hash: String,
}

impl CourseData {
    pub fn new(key: String, raw: RawCourseData) -> Self {
        let mut sections = SectionData::normalize(raw.sections);

        for section in sections.iter_mut() {
            section.course_key = Some(key.clone());
        }

        let description = raw
            .description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_owned());
        let category = raw.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_owned());
        let device_restrictions = raw.device_restrictions.unwrap_or(true);
        let max_devices = raw.max_devices.unwrap_or(DEFAULT_MAX_DEVICES);
        let guest_access_enabled = raw.guest_access_enabled.unwrap_or(false);

        let total_sections = sections.len();
        let total_sub_sections = sections
            .iter()
            .map(|section| section.sub_sections.len())
            .sum();
        let total_modules = sections.iter().map(SectionData::module_count).sum();
        let total_duration_minutes = sections.iter().map(SectionData::duration_minutes).sum();

        let hash = Self::hash_data(
            &key,
            &raw.title,
            &description,
            &category,
            raw.access_code.as_deref(),
            raw.thumbnail.as_deref(),
            device_restrictions,
            max_devices,
            guest_access_enabled,
            &sections,
        );

        Self {
            key,
            title: raw.title,
            description,
            category,
            access_code: raw.access_code,
            thumbnail: raw.thumbnail,
            device_restrictions,
            max_devices,
            guest_access_enabled,
            updated_at: raw.updated_at,
            sections,
            total_sections,
            total_sub_sections,
            total_modules,
            total_duration_minutes,
            hash,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn hash_data(
        key: &str,
        title: &str,
        description: &str,
        category: &str,
        access_code: Option<&str>,
        thumbnail: Option<&str>,
        device_restrictions: bool,
        max_devices: u32,
        guest_access_enabled: bool,
        sections: &[SectionData],
    ) -> String {
        let mut hasher = blake3::Hasher::new();

        hasher.update(key.as_bytes());
        hasher.update(title.as_bytes());
        hasher.update(description.as_bytes());
        hasher.update(category.as_bytes());

        if let Some(access_code) = access_code {
            hasher.update(access_code.as_bytes());
        }

        if let Some(thumbnail) = thumbnail {
            hasher.update(thumbnail.as_bytes());
        }

        hasher.update(&[device_restrictions as u8, guest_access_enabled as u8]);
        hasher.update(&max_devices.to_le_bytes());
        hasher.update(
            sections
                .iter()
                .map(|section| section.hash.clone())
                .collect::<Vec<_>>()
                .join("")
                .as_bytes(),
        );

        hasher.finalize().to_string()
    }

    pub fn load_and_write_formatted(path: PathBuf) -> Result<Self> {
        let data = Self::load(path.clone())?;

        data.check()?;
        data.clone().write(path)?;

        Ok(data)
    }

    pub fn load(path: PathBuf) -> Result<Self> {
        let raw_data = std::fs::read(&path)
            .with_context(|| format!("failed to read course file {}", path.display()))?;

        let key = path
            .file_stem()
            .and_then(|name| name.to_str())
            .with_context(|| format!("invalid course file name {}", path.display()))?
            .to_owned();
        let raw: RawCourseData = serde_json::from_slice(&raw_data[..])
            .with_context(|| format!("malformed course file {}", path.display()))?;

        Ok(Self::new(key, raw))
    }

    pub fn write(self, path: PathBuf) -> Result<()> {
        let raw: RawCourseData = self.into();
        let raw_data = serde_json::to_string_pretty(&raw)?;

        write_data(path, raw_data)
    }

    pub fn check(&self) -> Result<()> {
        for module in self.iter_modules() {
            module.check()?;
        }

        Ok(())
    }

    pub fn quiz_problems(&self) -> Vec<String> {
        self.iter_modules()
            .filter_map(|module| module.check().err().map(|error| format!("{error:#}")))
            .collect()
    }

    pub fn iter_modules(&self) -> impl Iterator<Item = &ModuleData> {
        self.sections.iter().flat_map(|section| {
            section.modules.iter().chain(
                section
                    .sub_sections
                    .iter()
                    .flat_map(|sub_section| sub_section.modules.iter()),
            )
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SectionData {
    pub id: Uuid,

    pub course_key: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub order: i64,

    #[serde(skip)]
    pub modules: Vec<ModuleData>,
    pub sub_sections: Vec<SubSectionData>,

    pub hash: String,
}

impl SectionData {
    // Fetch order is arbitrary; sections without an explicit order keep the
    // position they arrived in. The sort is stable, so equal orders never
    // reorder among themselves.
    pub fn normalize(raw: Vec<RawSectionData>) -> Vec<Self> {
        let mut sections: Vec<Self> = raw
            .into_iter()
            .enumerate()
            .map(|(position, raw)| Self::from_raw(raw, position))
            .collect();

        sections.sort_by_key(|section| section.order);

        sections
    }

    fn from_raw(raw: RawSectionData, position: usize) -> Self {
        let id = raw.id.unwrap_or_else(Uuid::new_v4);
        let order = raw.order.unwrap_or(position as i64);

        let mut modules = ModuleData::normalize(raw.modules);
        for module in modules.iter_mut() {
            module.section_id = Some(id);
        }

        let mut sub_sections: Vec<SubSectionData> = raw
            .sub_sections
            .into_iter()
            .map(SubSectionData::from_raw)
            .collect();
        for sub_section in sub_sections.iter_mut() {
            for module in sub_section.modules.iter_mut() {
                module.section_id = Some(id);
            }
        }

        let hash = Self::hash_data(
            id,
            &raw.title,
            raw.description.as_deref(),
            order,
            &modules,
            &sub_sections,
        );

        Self {
            id,
            course_key: None,
            title: raw.title,
            description: raw.description,
            order,
            modules,
            sub_sections,
            hash,
        }
    }

    fn hash_data(
        id: Uuid,
        title: &str,
        description: Option<&str>,
        order: i64,
        modules: &[ModuleData],
        sub_sections: &[SubSectionData],
    ) -> String {
        let mut hasher = blake3::Hasher::new();

        hasher.update(id.as_bytes());
        hasher.update(title.as_bytes());

        if let Some(description) = description {
            hasher.update(description.as_bytes());
        }

        hasher.update(&order.to_le_bytes());
        hasher.update(
            modules
                .iter()
                .map(|module| module.hash.clone())
                .collect::<Vec<_>>()
                .join("")
                .as_bytes(),
        );
        hasher.update(
            sub_sections
                .iter()
                .map(|sub_section| sub_section.hash.clone())
                .collect::<Vec<_>>()
                .join("")
                .as_bytes(),
        );

        hasher.finalize().to_string()
    }

    // Section-level and sub-section-level modules are counted at their own
    // level only.
    pub fn module_count(&self) -> usize {
        self.modules.len()
            + self
                .sub_sections
                .iter()
                .map(|sub_section| sub_section.modules.len())
                .sum::<usize>()
    }

    // A sub-section's stated duration already covers the content inside it,
    // so its modules are not summed a second time.
    pub fn duration_minutes(&self) -> u64 {
        self.modules
            .iter()
            .map(|module| u64::from(module.duration_minutes))
            .sum::<u64>()
            + self
                .sub_sections
                .iter()
                .map(|sub_section| u64::from(sub_section.duration_minutes))
                .sum::<u64>()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SubSectionData {
    pub id: Uuid,

    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub duration_minutes: u32,

    #[serde(skip)]
    pub modules: Vec<ModuleData>,

    pub hash: String,
}

impl SubSectionData {
    fn from_raw(raw: RawSubSectionData) -> Self {
        let id = raw.id.unwrap_or_else(Uuid::new_v4);
        let duration_minutes = duration::parse_minutes(raw.duration.as_deref());

        let mut modules = ModuleData::normalize(raw.modules);
        for module in modules.iter_mut() {
            module.sub_section_id = Some(id);
        }

        let hash = Self::hash_data(
            id,
            &raw.title,
            raw.description.as_deref(),
            raw.content.as_deref(),
            duration_minutes,
            &modules,
        );

        Self {
            id,
            title: raw.title,
            description: raw.description,
            content: raw.content,
            duration_minutes,
            modules,
            hash,
        }
    }

    fn hash_data(
        id: Uuid,
        title: &str,
        description: Option<&str>,
        content: Option<&str>,
        duration_minutes: u32,
        modules: &[ModuleData],
    ) -> String {
        let mut hasher = blake3::Hasher::new();

        hasher.update(id.as_bytes());
        hasher.update(title.as_bytes());

        if let Some(description) = description {
            hasher.update(description.as_bytes());
        }

        if let Some(content) = content {
            hasher.update(content.as_bytes());
        }

        hasher.update(&duration_minutes.to_le_bytes());
        hasher.update(
            modules
                .iter()
                .map(|module| module.hash.clone())
                .collect::<Vec<_>>()
                .join("")
                .as_bytes(),
        );

        hasher.finalize().to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ModuleKind {
    Video,
    Quiz,
    Document,
    Assignment,
    Discussion,
    Code,
    Image,
    Audio,
    Link,
    File,
    Text,
}

impl ModuleKind {
    // Open tag set: anything unrecognized renders as generic text content.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "video" => Self::Video,
            "quiz" => Self::Quiz,
            "document" => Self::Document,
            "assignment" => Self::Assignment,
            "discussion" => Self::Discussion,
            "code" => Self::Code,
            "image" => Self::Image,
            "audio" => Self::Audio,
            "link" => Self::Link,
            "file" => Self::File,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Quiz => "quiz",
            Self::Document => "document",
            Self::Assignment => "assignment",
            Self::Discussion => "discussion",
            Self::Code => "code",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Link => "link",
            Self::File => "file",
            Self::Text => "text",
        }
    }
}

impl From<String> for ModuleKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<ModuleKind> for String {
    fn from(kind: ModuleKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModuleData {
    pub id: Uuid,

    pub section_id: Option<Uuid>,
    pub sub_section_id: Option<Uuid>,
    pub title: String,
    pub kind: ModuleKind,
    pub content: Option<String>,
    pub duration_minutes: u32,
    pub order: i64,
    pub questions: Vec<QuestionData>,

    pub hash: String,
}

impl ModuleData {
    fn normalize(raw: Vec<RawModuleData>) -> Vec<Self> {
        let mut modules: Vec<Self> = raw
            .into_iter()
            .enumerate()
            .map(|(position, raw)| Self::from_raw(raw, position))
            .collect();

        modules.sort_by_key(|module| module.order);

        modules
    }

    fn from_raw(raw: RawModuleData, position: usize) -> Self {
        let id = raw.id.unwrap_or_else(Uuid::new_v4);
        let kind = raw
            .module_type
            .as_deref()
            .map(ModuleKind::from_tag)
            .unwrap_or(ModuleKind::Text);
        let duration_minutes = duration::parse_minutes(raw.duration.as_deref());
        let order = raw.order.unwrap_or(position as i64);

        let mut questions: Vec<QuestionData> = raw.questions.into_iter().map(Into::into).collect();
        for question in questions.iter_mut() {
            question.module_id = Some(id);
        }

        let hash = Self::hash_data(
            id,
            &raw.title,
            kind,
            raw.content.as_deref(),
            duration_minutes,
            order,
            &questions,
        );

        Self {
            id,
            section_id: None,
            sub_section_id: None,
            title: raw.title,
            kind,
            content: raw.content,
            duration_minutes,
            order,
            questions,
            hash,
        }
    }

    fn hash_data(
        id: Uuid,
        title: &str,
        kind: ModuleKind,
        content: Option<&str>,
        duration_minutes: u32,
        order: i64,
        questions: &[QuestionData],
    ) -> String {
        let mut hasher = blake3::Hasher::new();

        hasher.update(id.as_bytes());
        hasher.update(title.as_bytes());
        hasher.update(kind.as_str().as_bytes());

        if let Some(content) = content {
            hasher.update(content.as_bytes());
        }

        hasher.update(&duration_minutes.to_le_bytes());
        hasher.update(&order.to_le_bytes());
        hasher.update(
            questions
                .iter()
                .map(|question| question.hash.clone())
                .collect::<Vec<_>>()
                .join("")
                .as_bytes(),
        );

        hasher.finalize().to_string()
    }

    pub fn check(&self) -> Result<()> {
        if self.kind == ModuleKind::Quiz {
            validate_quiz(&self.questions[..]).with_context(|| {
                format!("module {} ({}) has an invalid quiz", self.id, self.title)
            })?;
        }

        Ok(())
    }
}

pub type ExpansionSet = BTreeSet<(Uuid, Uuid)>;

// Disclosure-widget state for the curriculum tree: a pure flip of one
// composite key, leaving the input set untouched.
pub fn toggle_expansion(
    open: &ExpansionSet,
    section_id: Uuid,
    sub_section_id: Uuid,
) -> ExpansionSet {
    let mut next = open.clone();
    let key = (section_id, sub_section_id);

    if !next.remove(&key) {
        next.insert(key);
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_from_json(json: &str) -> CourseData {
        let raw: RawCourseData = serde_json::from_str(json).unwrap();

        CourseData::new("demo-course".to_owned(), raw)
    }

    #[test]
    fn totals_count_each_module_once() {
        let course = course_from_json(
            r#"{
                "title": "Rust from scratch",
                "sections": [
                    {
                        "title": "Getting started",
                        "order": 1,
                        "modules": [
                            {"title": "Welcome", "type": "video", "duration": "5 min"},
                            {"title": "Setup", "type": "text"}
                        ],
                        "subSections": [
                            {
                                "title": "First steps",
                                "duration": "45 min",
                                "modules": [
                                    {"title": "Variables", "type": "video"},
                                    {"title": "Functions", "type": "video"},
                                    {"title": "Checkpoint", "type": "quiz"}
                                ]
                            }
                        ]
                    }
                ]
            }"#,
        );

        assert_eq!(course.total_sections, 1);
        assert_eq!(course.total_sub_sections, 1);
        assert_eq!(course.total_modules, 5);
    }

    #[test]
    fn missing_course_fields_fall_back_to_defaults() {
        let course = course_from_json(r#"{"title": "Bare course"}"#);

        assert_eq!(course.description, DEFAULT_DESCRIPTION);
        assert_eq!(course.category, DEFAULT_CATEGORY);
        assert!(course.device_restrictions);
        assert_eq!(course.max_devices, DEFAULT_MAX_DEVICES);
        assert!(!course.guest_access_enabled);
        assert_eq!(course.total_sections, 0);
        assert_eq!(course.total_modules, 0);
    }

    #[test]
    fn sections_sort_by_order_with_positional_fallback() {
        let course = course_from_json(
            r#"{
                "title": "Ordering",
                "sections": [
                    {"title": "Last", "order": 2},
                    {"title": "Unordered"},
                    {"title": "First", "order": 1},
                    {"title": "Also first", "order": 1}
                ]
            }"#,
        );

        let titles: Vec<&str> = course
            .sections
            .iter()
            .map(|section| section.title.as_str())
            .collect();

        // "Unordered" takes order 1 from its fetch position; the stable sort
        // keeps the three equal orders in their original relative order.
        assert_eq!(titles, ["Unordered", "First", "Also first", "Last"]);
    }

    #[test]
    fn modules_sort_by_order_within_their_container() {
        let course = course_from_json(
            r#"{
                "title": "Ordering",
                "sections": [
                    {
                        "title": "Only",
                        "modules": [
                            {"title": "Second", "order": 5},
                            {"title": "First", "order": 3}
                        ]
                    }
                ]
            }"#,
        );

        let titles: Vec<&str> = course.sections[0]
            .modules
            .iter()
            .map(|module| module.title.as_str())
            .collect();

        assert_eq!(titles, ["First", "Second"]);
    }

    #[test]
    fn unknown_module_type_falls_back_to_text() {
        let course = course_from_json(
            r#"{
                "title": "Types",
                "sections": [
                    {
                        "title": "Only",
                        "modules": [
                            {"title": "Mystery", "type": "hologram"},
                            {"title": "Untyped"}
                        ]
                    }
                ]
            }"#,
        );

        assert_eq!(course.sections[0].modules[0].kind, ModuleKind::Text);
        assert_eq!(course.sections[0].modules[1].kind, ModuleKind::Text);
    }

    #[test]
    fn durations_parse_leniently_with_defaults() {
        let course = course_from_json(
            r#"{
                "title": "Durations",
                "sections": [
                    {
                        "title": "Only",
                        "modules": [{"title": "Talk", "type": "video", "duration": "12 min"}],
                        "subSections": [
                            {"title": "Stated", "duration": "45 min"},
                            {"title": "Unstated"}
                        ]
                    }
                ]
            }"#,
        );

        assert_eq!(course.sections[0].modules[0].duration_minutes, 12);
        assert_eq!(course.sections[0].sub_sections[0].duration_minutes, 45);
        assert_eq!(course.sections[0].sub_sections[1].duration_minutes, 60);
        assert_eq!(course.total_duration_minutes, 12 + 45 + 60);
    }

    #[test]
    fn addressing_references_point_back_to_owners() {
        let course = course_from_json(
            r#"{
                "title": "Refs",
                "sections": [
                    {
                        "title": "Only",
                        "modules": [{"title": "Top", "type": "text"}],
                        "subSections": [
                            {"title": "Inner", "modules": [{"title": "Nested", "type": "text"}]}
                        ]
                    }
                ]
            }"#,
        );

        let section = &course.sections[0];
        assert_eq!(section.course_key.as_deref(), Some("demo-course"));

        let top = &section.modules[0];
        assert_eq!(top.section_id, Some(section.id));
        assert_eq!(top.sub_section_id, None);

        let sub_section = &section.sub_sections[0];
        let nested = &sub_section.modules[0];
        assert_eq!(nested.section_id, Some(section.id));
        assert_eq!(nested.sub_section_id, Some(sub_section.id));
    }

    #[test]
    fn quiz_module_check_reports_the_reason() {
        let course = course_from_json(
            r#"{
                "title": "Quizzes",
                "sections": [
                    {
                        "title": "Only",
                        "modules": [
                            {
                                "title": "Checkpoint",
                                "type": "quiz",
                                "questions": [
                                    {
                                        "question": "Pick one",
                                        "options": ["a", "b", "c", "d"]
                                    }
                                ]
                            }
                        ]
                    }
                ]
            }"#,
        );

        let error = course.check().unwrap_err();
        assert!(format!("{error:#}").contains("no correct option selected"));

        let problems = course.quiz_problems();
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn equal_content_hashes_to_equal_values() {
        let json = r#"{
            "title": "Stable",
            "sections": [
                {
                    "id": "6f2d7f3a-32a1-4bcb-8f7e-6d2cbbd1a111",
                    "title": "Only",
                    "order": 1,
                    "modules": [
                        {
                            "id": "6f2d7f3a-32a1-4bcb-8f7e-6d2cbbd1a222",
                            "title": "Talk",
                            "type": "video",
                            "duration": "10 min"
                        }
                    ]
                }
            ]
        }"#;

        let first = course_from_json(json);
        let second = course_from_json(json);

        assert_eq!(first.hash, second.hash);
        assert_eq!(first.sections[0].hash, second.sections[0].hash);
    }

    #[test]
    fn toggle_expansion_flips_membership_without_mutating_input() {
        let section_id = Uuid::new_v4();
        let sub_section_id = Uuid::new_v4();
        let open = ExpansionSet::new();

        let opened = toggle_expansion(&open, section_id, sub_section_id);
        assert!(opened.contains(&(section_id, sub_section_id)));
        assert!(open.is_empty());

        let closed = toggle_expansion(&opened, section_id, sub_section_id);
        assert_eq!(closed, open);
    }
}
