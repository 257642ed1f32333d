use std::path::Path;

use anyhow::Result;

use curriculum_data_sync::helpers::course_file_paths;
use curriculum_data_sync::CourseData;

pub fn format(data_path: &Path) -> Result<()> {
    for path in course_file_paths(data_path)? {
        CourseData::load_and_write_formatted(path)?;
    }

    Ok(())
}
