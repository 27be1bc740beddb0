// Storage module - holds the dataset the query engine reads from
// Everything here is loaded once at startup and never mutated afterwards

pub mod dataset;
pub mod id;
pub mod table;

pub use dataset::{Dataset, DatasetError};
pub use id::Id;
pub use table::Table;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fields of a record the engine never reads
/// They are kept so a record serializes back the way it was stored
pub type Extra = Map<String, Value>;

/// A stored field the engine reads but never reshapes
///
/// `None` means the key was absent and stays absent on output; an explicit
/// `null` is kept as `Some(Value::Null)` so it round-trips too.
pub type Field = Option<Value>;

/// Deserialize a present key as `Some`, even when its value is `null`
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Field, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// The field as text, when it holds a string
fn field_str(field: &Field) -> Option<&str> {
    field.as_ref().and_then(Value::as_str)
}

/// The field spliced into text: strings as-is, absent as "undefined",
/// anything else in its JSON form
fn field_text(field: &Field) -> String {
    match field {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A row type that can live in a [`Table`]
pub trait Record {
    /// Singular entity name used in "not found" messages
    const ENTITY: &'static str;

    fn id(&self) -> &Id;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Id,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub first_name: Field,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub last_name: Field,
    /// Stored grade point average, treated as authoritative
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub gpa: Field,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Student {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            field_text(&self.first_name),
            field_text(&self.last_name)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
    pub id: Id,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Id,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub code: Field,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Field,
    pub instructor_id: Id,
    /// Free-form meeting times, passed through untouched
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub schedule: Field,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: Id,
    pub student_id: Id,
    pub course_id: Id,
    /// Open set of tags; "enrolled" is the only one the engine interprets
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub status: Field,
    /// Letter grade, absent until the course is graded
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub grade: Field,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Enrollment {
    pub const STATUS_ENROLLED: &'static str = "enrolled";

    /// Exact, case-sensitive match on the "enrolled" tag
    pub fn is_enrolled(&self) -> bool {
        field_str(&self.status) == Some(Self::STATUS_ENROLLED)
    }

    /// Whether any grade has been recorded
    /// null, false, 0 and "" all count as no grade
    pub fn is_graded(&self) -> bool {
        match &self.grade {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    /// The letter grade, if the grade is text
    pub fn letter_grade(&self) -> Option<&str> {
        field_str(&self.grade)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Id,
    pub course_id: Id,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: Id,
    pub enrollment_id: Id,
    #[serde(flatten)]
    pub extra: Extra,
}

// Every entity exposes its id the same way
macro_rules! impl_record {
    ($($ty:ty => $entity:literal),* $(,)?) => {
        $(
            impl Record for $ty {
                const ENTITY: &'static str = $entity;

                fn id(&self) -> &Id {
                    &self.id
                }
            }
        )*
    };
}

impl_record! {
    Student => "Student",
    Instructor => "Instructor",
    Course => "Course",
    Enrollment => "Enrollment",
    Assignment => "Assignment",
    Grade => "Grade",
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unread_fields_survive_round_trip() {
        let stored = json!({
            "id": 3,
            "studentId": 1,
            "courseId": 2,
            "status": "enrolled",
            "enrolledOn": "2024-01-15"
        });

        let enrollment: Enrollment = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(enrollment.extra["enrolledOn"], "2024-01-15");
        assert_eq!(serde_json::to_value(&enrollment).unwrap(), stored);
    }

    #[test]
    fn test_absent_and_null_fields_round_trip() {
        for stored in [
            json!({"id": 1}),
            json!({"id": 1, "gpa": null}),
            json!({"id": 1, "firstName": null, "lastName": "Lima"}),
        ] {
            let student: Student = serde_json::from_value(stored.clone()).unwrap();
            assert_eq!(serde_json::to_value(&student).unwrap(), stored);
        }

        let stored = json!({"id": 1, "instructorId": 1, "schedule": null});
        let course: Course = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(course.schedule, Some(Value::Null));
        assert_eq!(serde_json::to_value(&course).unwrap(), stored);
    }

    #[test]
    fn test_full_name_splices_fields() {
        let student: Student = serde_json::from_value(
            json!({"id": 1, "firstName": "Ana", "lastName": "Lima"}),
        )
        .unwrap();
        assert_eq!(student.full_name(), "Ana Lima");

        let student: Student =
            serde_json::from_value(json!({"id": 1, "firstName": "Ana", "lastName": null})).unwrap();
        assert_eq!(student.full_name(), "Ana null");

        let student: Student = serde_json::from_value(json!({"id": 1, "firstName": "Ana"})).unwrap();
        assert_eq!(student.full_name(), "Ana undefined");
    }

    #[test]
    fn test_status_match_is_case_sensitive() {
        let mut enrollment: Enrollment =
            serde_json::from_value(json!({"id": 1, "studentId": 1, "courseId": 1})).unwrap();
        assert!(!enrollment.is_enrolled());

        enrollment.status = Some(json!("Enrolled"));
        assert!(!enrollment.is_enrolled());

        enrollment.status = Some(json!("enrolled"));
        assert!(enrollment.is_enrolled());
    }

    #[test]
    fn test_empty_or_null_grade_is_no_grade() {
        for grade in [json!(""), Value::Null, json!(0), json!(false)] {
            let enrollment: Enrollment = serde_json::from_value(
                json!({"id": 1, "studentId": 1, "courseId": 1, "grade": grade}),
            )
            .unwrap();
            assert!(!enrollment.is_graded());
        }

        let enrollment: Enrollment = serde_json::from_value(
            json!({"id": 1, "studentId": 1, "courseId": 1, "grade": "B+"}),
        )
        .unwrap();
        assert!(enrollment.is_graded());
        assert_eq!(enrollment.letter_grade(), Some("B+"));
    }
}
