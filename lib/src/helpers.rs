use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::CourseData;

pub fn course_file_paths(data_path: &Path) -> Result<Vec<PathBuf>> {
    let data_path = fs::canonicalize(data_path)?;
    let mut paths = Vec::new();

    for entry in fs::read_dir(&data_path)? {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            bail!("unexpected directory {} in course data", path.display());
        }

        if path.extension().and_then(|extension| extension.to_str()) == Some("json") {
            paths.push(path);
        }
    }

    // read_dir order is platform-dependent.
    paths.sort();

    Ok(paths)
}

pub fn write_data(path: PathBuf, data: String) -> Result<()> {
    fs::write(path, format!("{data}\n"))?;

    Ok(())
}

pub fn load_courses_data_and_write_formatted(data_path: &Path) -> Result<Vec<CourseData>> {
    course_file_paths(data_path)?
        .into_iter()
        .map(CourseData::load_and_write_formatted)
        .collect()
}
