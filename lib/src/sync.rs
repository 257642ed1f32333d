use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CourseData, ModuleData, SectionData};

// The content store upserts at module granularity, addressed by the
// section/sub-section references each module carries. Courses and sections
// sync their own records without the children that travel separately.

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SyncData {
    pub courses_to_sync: Vec<CourseData>,
    pub courses_to_delete: Vec<String>,

    pub sections_to_sync: Vec<SectionData>,
    pub sections_to_delete: Vec<Uuid>,

    pub modules_to_sync: Vec<ModuleData>,
    pub modules_to_delete: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SyncMetadata {
    pub courses_metadata: HashMap<String, String>,
    pub sections_metadata: HashMap<Uuid, String>,
    pub modules_metadata: HashMap<Uuid, String>,
}

impl SyncData {
    pub fn compute(courses: &[CourseData], metadata: &SyncMetadata) -> Self {
        let mut data = Self::default();

        for course in courses {
            if metadata.courses_metadata.get(&course.key) != Some(&course.hash) {
                data.courses_to_sync.push(course.clone());
            }

            for section in &course.sections {
                if metadata.sections_metadata.get(&section.id) != Some(&section.hash) {
                    data.sections_to_sync.push(section.clone());
                }
            }

            for module in course.iter_modules() {
                if metadata.modules_metadata.get(&module.id) != Some(&module.hash) {
                    data.modules_to_sync.push(module.clone());
                }
            }
        }

        let local_courses: HashSet<&str> = courses.iter().map(|course| course.key.as_str()).collect();
        let local_sections: HashSet<Uuid> = courses
            .iter()
            .flat_map(|course| course.sections.iter().map(|section| section.id))
            .collect();
        let local_modules: HashSet<Uuid> = courses
            .iter()
            .flat_map(|course| course.iter_modules().map(|module| module.id))
            .collect();

        data.courses_to_delete = metadata
            .courses_metadata
            .keys()
            .filter(|key| !local_courses.contains(key.as_str()))
            .cloned()
            .collect();
        data.sections_to_delete = metadata
            .sections_metadata
            .keys()
            .filter(|id| !local_sections.contains(id))
            .copied()
            .collect();
        data.modules_to_delete = metadata
            .modules_metadata
            .keys()
            .filter(|id| !local_modules.contains(id))
            .copied()
            .collect();

        data
    }

    pub fn is_empty(&self) -> bool {
        self.courses_to_sync.is_empty()
            && self.courses_to_delete.is_empty()
            && self.sections_to_sync.is_empty()
            && self.sections_to_delete.is_empty()
            && self.modules_to_sync.is_empty()
            && self.modules_to_delete.is_empty()
    }
}
