// Dataset - the six entity tables, loaded once from a JSON file

use super::{Assignment, Course, Enrollment, Grade, Instructor, Student, Table};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading the dataset at startup
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk shape of the dataset file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DatasetFile {
    pub students: Vec<Student>,
    pub instructors: Vec<Instructor>,
    pub courses: Vec<Course>,
    pub enrollments: Vec<Enrollment>,
    pub assignments: Vec<Assignment>,
    pub grades: Vec<Grade>,
}

/// The whole in-memory database
/// Built once before any request is served and shared read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub students: Table<Student>,
    pub instructors: Table<Instructor>,
    pub courses: Table<Course>,
    pub enrollments: Table<Enrollment>,
    pub assignments: Table<Assignment>,
    pub grades: Table<Grade>,
}

impl Dataset {
    /// Read and parse a dataset file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let dataset = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "dataset parsed");
        Ok(dataset)
    }

    /// Parse a dataset from JSON text
    pub fn from_json(text: &str) -> Result<Self, DatasetError> {
        let file: DatasetFile = serde_json::from_str(text)?;
        Ok(Self::from(file))
    }

    /// Build a dataset from records already in memory
    pub fn from_records(
        students: Vec<Student>,
        instructors: Vec<Instructor>,
        courses: Vec<Course>,
        enrollments: Vec<Enrollment>,
        assignments: Vec<Assignment>,
        grades: Vec<Grade>,
    ) -> Self {
        Self {
            students: Table::new(students),
            instructors: Table::new(instructors),
            courses: Table::new(courses),
            enrollments: Table::new(enrollments),
            assignments: Table::new(assignments),
            grades: Table::new(grades),
        }
    }

    /// A one-line summary of table sizes, for startup logs
    pub fn summary(&self) -> String {
        format!(
            "{} students, {} instructors, {} courses, {} enrollments, {} assignments, {} grades",
            self.students.len(),
            self.instructors.len(),
            self.courses.len(),
            self.enrollments.len(),
            self.assignments.len(),
            self.grades.len(),
        )
    }
}

impl From<DatasetFile> for Dataset {
    fn from(file: DatasetFile) -> Self {
        Self::from_records(
            file.students,
            file.instructors,
            file.courses,
            file.enrollments,
            file.assignments,
            file.grades,
        )
    }
}

/// Serializes back to the file shape, so `/data` returns what was loaded
impl Serialize for Dataset {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Dataset", 6)?;
        state.serialize_field("students", self.students.scan())?;
        state.serialize_field("instructors", self.instructors.scan())?;
        state.serialize_field("courses", self.courses.scan())?;
        state.serialize_field("enrollments", self.enrollments.scan())?;
        state.serialize_field("assignments", self.assignments.scan())?;
        state.serialize_field("grades", self.grades.scan())?;
        state.end()
    }
}
