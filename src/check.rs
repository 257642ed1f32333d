use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;

use curriculum_data_sync::helpers::course_file_paths;
use curriculum_data_sync::CourseData;

#[derive(Serialize)]
struct CheckReport {
    courses: Vec<CourseReport>,
}

#[derive(Serialize)]
struct CourseReport {
    key: String,
    total_sections: usize,
    total_sub_sections: usize,
    total_modules: usize,
    total_duration_minutes: u64,
    problems: Vec<String>,
}

pub fn check(data_path: &Path, json: bool) -> Result<()> {
    let mut courses = Vec::new();

    for path in course_file_paths(data_path)? {
        let course = CourseData::load(path)?;
        let problems = course.quiz_problems();

        courses.push(CourseReport {
            key: course.key,
            total_sections: course.total_sections,
            total_sub_sections: course.total_sub_sections,
            total_modules: course.total_modules,
            total_duration_minutes: course.total_duration_minutes,
            problems,
        });
    }

    let failed = courses.iter().any(|course| !course.problems.is_empty());

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&CheckReport { courses })?
        );
    } else {
        for course in &courses {
            println!(
                "{}: {} section(s), {} sub-section(s), {} module(s), ~{} min",
                course.key,
                course.total_sections,
                course.total_sub_sections,
                course.total_modules,
                course.total_duration_minutes,
            );

            for problem in &course.problems {
                println!("  problem: {problem}");
            }
        }
    }

    if failed {
        bail!("course data check failed");
    }

    Ok(())
}
