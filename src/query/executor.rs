// Query Engine
// This module answers lookups, relationship traversals and derived
// statistics over the loaded dataset

use super::grading;
use super::parser::{Collection, Query};
use super::{ErrorBody, QueryError};
use crate::storage::{
    Assignment, Course, Dataset, Enrollment, Grade, Id, Instructor, Record, Student, Table,
};
use serde::Serialize;
use std::collections::HashSet;

/// The query engine owns the dataset and answers every query against it
/// This is the main interface to the database
#[derive(Debug, Default)]
pub struct QueryEngine {
    dataset: Dataset,
}

/// `{studentId, name, gpa}` for GET /api/students/:id/gpa
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpaReport {
    pub student_id: Id,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<serde_json::Value>,
}

/// Either the course average or the "no grades" sentinel
/// Both are successful results; callers tell them apart by shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CourseAverage {
    #[serde(rename_all = "camelCase")]
    Computed {
        /// Echoes the id as it was requested
        course_id: Id,
        #[serde(rename = "averageGPA")]
        average_gpa: String,
    },
    NoGrades(ErrorBody),
}

impl CourseAverage {
    pub const NO_GRADES: &'static str = "No grades available for this course";
}

/// One line of a student's schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<&'a serde_json::Value>,
}

/// A schedule line, or the reason its course could not be joined
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScheduleSlot<'a> {
    Entry(ScheduleEntry<'a>),
    BadJoin(ErrorBody),
}

/// A borrowed record of any entity type
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum RecordRef<'a> {
    Student(&'a Student),
    Instructor(&'a Instructor),
    Course(&'a Course),
    Enrollment(&'a Enrollment),
    Assignment(&'a Assignment),
    Grade(&'a Grade),
}

/// Represents the result of a query execution
/// Serializes straight to the JSON body the API returns
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryResult<'a> {
    /// A single record
    Record(RecordRef<'a>),
    /// Records from one table, in stored order
    Records(Vec<RecordRef<'a>>),
    /// Records reached through a foreign key; a dangling key yields null
    Joined(Vec<Option<RecordRef<'a>>>),
    Gpa(GpaReport),
    Average(CourseAverage),
    Schedule(Vec<ScheduleSlot<'a>>),
    Dataset(&'a Dataset),
    /// Plain text, not JSON
    Text(&'static str),
}

impl QueryResult<'_> {
    /// Format the result for display in the shell
    pub fn format(&self) -> String {
        match self {
            QueryResult::Text(text) => text.to_string(),
            other => serde_json::to_string_pretty(other)
                .unwrap_or_else(|e| format!("failed to render result: {}", e)),
        }
    }
}

fn records<'a, T: 'a>(
    rows: impl IntoIterator<Item = &'a T>,
    wrap: fn(&'a T) -> RecordRef<'a>,
) -> Vec<RecordRef<'a>> {
    rows.into_iter().map(wrap).collect()
}

fn joined<'a, T: 'a>(
    rows: Vec<Option<&'a T>>,
    wrap: fn(&'a T) -> RecordRef<'a>,
) -> Vec<Option<RecordRef<'a>>> {
    rows.into_iter().map(|row| row.map(wrap)).collect()
}

impl QueryEngine {
    /// Create a query engine over a fully loaded dataset
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    /// Execute a query and return the result
    pub fn execute(&self, query: &Query) -> Result<QueryResult<'_>, QueryError> {
        let result = match query {
            Query::Dump => QueryResult::Dataset(&self.dataset),
            Query::Ping => QueryResult::Text("route works!"),
            Query::List(collection) => QueryResult::Records(self.list(*collection)),
            Query::Get(collection, id) => QueryResult::Record(self.get(*collection, id)?),
            Query::StudentEnrollments(id) => {
                QueryResult::Records(records(self.student_enrollments(id), RecordRef::Enrollment))
            }
            Query::StudentCourses(id) => {
                QueryResult::Joined(joined(self.student_courses(id), RecordRef::Course))
            }
            Query::CourseStudents(id) => {
                QueryResult::Joined(joined(self.course_students(id), RecordRef::Student))
            }
            Query::InstructorCourses(id) => {
                QueryResult::Records(records(self.instructor_courses(id), RecordRef::Course))
            }
            Query::CourseAssignments(id) => {
                QueryResult::Records(records(self.course_assignments(id), RecordRef::Assignment))
            }
            Query::EnrollmentGrades(id) => {
                QueryResult::Records(records(self.enrollment_grades(id), RecordRef::Grade))
            }
            Query::StudentGpa(id) => QueryResult::Gpa(self.student_gpa(id)?),
            Query::CourseAverage(id) => QueryResult::Average(self.course_average(id)),
            Query::InstructorStudents(id) => {
                QueryResult::Joined(joined(self.instructor_students(id), RecordRef::Student))
            }
            Query::StudentSchedule(id) => QueryResult::Schedule(self.student_schedule(id)),
        };

        Ok(result)
    }

    /// Every record of a collection, unfiltered
    pub fn list(&self, collection: Collection) -> Vec<RecordRef<'_>> {
        let ds = &self.dataset;
        match collection {
            Collection::Students => records(ds.students.scan(), RecordRef::Student),
            Collection::Instructors => records(ds.instructors.scan(), RecordRef::Instructor),
            Collection::Courses => records(ds.courses.scan(), RecordRef::Course),
            Collection::Enrollments => records(ds.enrollments.scan(), RecordRef::Enrollment),
            Collection::Assignments => records(ds.assignments.scan(), RecordRef::Assignment),
            Collection::Grades => records(ds.grades.scan(), RecordRef::Grade),
        }
    }

    /// One record by id, or NotFound
    pub fn get(&self, collection: Collection, id: &Id) -> Result<RecordRef<'_>, QueryError> {
        let ds = &self.dataset;
        let record = match collection {
            Collection::Students => RecordRef::Student(ds.students.get(id)?),
            Collection::Instructors => RecordRef::Instructor(ds.instructors.get(id)?),
            Collection::Courses => RecordRef::Course(ds.courses.get(id)?),
            Collection::Enrollments => RecordRef::Enrollment(ds.enrollments.get(id)?),
            Collection::Assignments => RecordRef::Assignment(ds.assignments.get(id)?),
            Collection::Grades => RecordRef::Grade(ds.grades.get(id)?),
        };
        Ok(record)
    }

    pub fn student_enrollments(&self, student_id: &Id) -> Vec<&Enrollment> {
        self.dataset
            .enrollments
            .filter(|e| &e.student_id == student_id)
    }

    /// Courses of every enrollment of the student, one entry per enrollment
    /// An enrollment pointing at a missing course yields None in its slot
    pub fn student_courses(&self, student_id: &Id) -> Vec<Option<&Course>> {
        self.student_enrollments(student_id)
            .into_iter()
            .map(|e| resolve(&self.dataset.courses, &e.course_id))
            .collect()
    }

    /// Students of every enrollment in the course, one entry per enrollment
    pub fn course_students(&self, course_id: &Id) -> Vec<Option<&Student>> {
        self.dataset
            .enrollments
            .filter(|e| &e.course_id == course_id)
            .into_iter()
            .map(|e| resolve(&self.dataset.students, &e.student_id))
            .collect()
    }

    pub fn instructor_courses(&self, instructor_id: &Id) -> Vec<&Course> {
        self.dataset
            .courses
            .filter(|c| &c.instructor_id == instructor_id)
    }

    pub fn course_assignments(&self, course_id: &Id) -> Vec<&Assignment> {
        self.dataset
            .assignments
            .filter(|a| &a.course_id == course_id)
    }

    pub fn enrollment_grades(&self, enrollment_id: &Id) -> Vec<&Grade> {
        self.dataset
            .grades
            .filter(|g| &g.enrollment_id == enrollment_id)
    }

    /// Students enrolled in any course the instructor teaches
    ///
    /// Deduplicated by student id, first occurrence wins. A dangling student
    /// reference shows up once as None per distinct missing id.
    pub fn instructor_students(&self, instructor_id: &Id) -> Vec<Option<&Student>> {
        let course_ids: HashSet<&Id> = self
            .instructor_courses(instructor_id)
            .into_iter()
            .map(|c| &c.id)
            .collect();

        let mut seen = HashSet::new();
        self.dataset
            .enrollments
            .filter(|e| course_ids.contains(&&e.course_id))
            .into_iter()
            .filter(|e| seen.insert(e.student_id.clone()))
            .map(|e| resolve(&self.dataset.students, &e.student_id))
            .collect()
    }

    /// The stored GPA of a student, passed through without recomputation
    pub fn student_gpa(&self, student_id: &Id) -> Result<GpaReport, QueryError> {
        let student = self.dataset.students.get(student_id)?;
        Ok(GpaReport {
            student_id: student.id.clone(),
            name: student.full_name(),
            gpa: student.gpa.clone(),
        })
    }

    /// Average grade points over the graded enrollments of a course
    pub fn course_average(&self, course_id: &Id) -> CourseAverage {
        let graded = self
            .dataset
            .enrollments
            .filter(|e| &e.course_id == course_id && e.is_graded());

        // Grades that are not text weigh 0 like any unknown letter
        let letters = graded.iter().map(|e| e.letter_grade().unwrap_or_default());
        match grading::average(letters) {
            Some(average_gpa) => CourseAverage::Computed {
                course_id: course_id.clone(),
                average_gpa,
            },
            None => CourseAverage::NoGrades(ErrorBody::new(CourseAverage::NO_GRADES)),
        }
    }

    /// Course code, name and meeting times for each active enrollment
    /// Only status "enrolled" (exact match) counts
    pub fn student_schedule(&self, student_id: &Id) -> Vec<ScheduleSlot<'_>> {
        self.dataset
            .enrollments
            .filter(|e| &e.student_id == student_id && e.is_enrolled())
            .into_iter()
            .map(|e| match join(&self.dataset.courses, &e.course_id) {
                Ok(course) => ScheduleSlot::Entry(ScheduleEntry {
                    course_code: course.code.as_ref(),
                    course_name: course.name.as_ref(),
                    schedule: course.schedule.as_ref(),
                }),
                Err(err) => ScheduleSlot::BadJoin(ErrorBody::from(&err)),
            })
            .collect()
    }
}

/// Follow a foreign key, turning a miss into BadJoin
fn join<'a, T: Record>(table: &'a Table<T>, id: &Id) -> Result<&'a T, QueryError> {
    table.find(id).ok_or_else(|| {
        tracing::warn!(entity = T::ENTITY, id = %id, "dangling reference");
        QueryError::BadJoin {
            entity: T::ENTITY,
            id: id.clone(),
        }
    })
}

/// Follow a foreign key inside a list result; a miss becomes None
fn resolve<'a, T: Record>(table: &'a Table<T>, id: &Id) -> Option<&'a T> {
    join(table, id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fixtures::engine;
    use serde_json::json;

    fn ids<T: Record>(rows: &[&T]) -> Vec<String> {
        rows.iter().map(|r| r.id().key().to_string()).collect()
    }

    fn joined_ids<T: Record>(rows: &[Option<&T>]) -> Vec<Option<String>> {
        rows.iter()
            .map(|r| r.map(|r| r.id().key().to_string()))
            .collect()
    }

    #[test]
    fn test_get_by_id_accepts_text_ids() {
        let engine = engine();
        for collection in Collection::ALL {
            let first = engine.list(collection)[0];
            let id = serde_json::to_value(first).unwrap()["id"].to_string();
            assert!(engine.get(collection, &Id::from(id.as_str())).is_ok());
        }
    }

    #[test]
    fn test_get_by_id_missing_is_not_found() {
        let engine = engine();
        for collection in Collection::ALL {
            for id in ["424242", "abc", ""] {
                let err = engine.get(collection, &Id::from(id)).unwrap_err();
                assert!(matches!(err, QueryError::NotFound { .. }));
            }
        }

        let err = engine.get(Collection::Courses, &Id::from("5")).unwrap_err();
        assert_eq!(err.to_string(), "Course not found");
    }

    #[test]
    fn test_list_returns_stored_collection_verbatim() {
        let engine = engine();
        let students = serde_json::to_value(engine.list(Collection::Students)).unwrap();
        let stored: serde_json::Value =
            serde_json::from_str(crate::query::fixtures::CAMPUS_JSON).unwrap();
        assert_eq!(students, stored["students"]);
        assert_eq!(engine.list(Collection::Enrollments).len(), 9);
    }

    #[test]
    fn test_student_enrollments_in_stored_order() {
        let engine = engine();
        assert_eq!(
            ids(&engine.student_enrollments(&Id::from("1"))),
            vec!["100", "103", "108"]
        );
        assert!(engine.student_enrollments(&Id::from("4")).is_empty());
    }

    #[test]
    fn test_student_courses_keeps_dangling_slot() {
        let engine = engine();
        assert_eq!(
            joined_ids(&engine.student_courses(&Id::from("7"))),
            vec![Some("10".to_string()), Some("11".to_string()), None]
        );
        assert!(engine.student_courses(&Id::from("4")).is_empty());
    }

    #[test]
    fn test_course_students_keeps_dangling_slot() {
        let engine = engine();
        assert_eq!(
            joined_ids(&engine.course_students(&Id::from("12"))),
            vec![Some("2".to_string()), None]
        );
    }

    #[test]
    fn test_student_course_round_trip() {
        let engine = engine();
        let student = Id::from(1);
        for course in engine.student_courses(&student).into_iter().flatten() {
            let students = engine.course_students(&course.id);
            assert!(students.iter().flatten().any(|s| s.id == student));
        }
    }

    #[test]
    fn test_simple_relationships() {
        let engine = engine();
        assert_eq!(ids(&engine.instructor_courses(&Id::from("1"))), vec!["10", "11"]);
        assert!(engine.instructor_courses(&Id::from("3")).is_empty());
        assert_eq!(
            ids(&engine.course_assignments(&Id::from("10"))),
            vec!["1000", "1001"]
        );
        assert!(engine.course_assignments(&Id::from("11")).is_empty());
        assert_eq!(
            ids(&engine.enrollment_grades(&Id::from("100"))),
            vec!["5000", "5001"]
        );
        assert!(engine.enrollment_grades(&Id::from("101")).is_empty());
    }

    #[test]
    fn test_instructor_students_deduplicates_by_student_id() {
        let engine = engine();
        // Five enrollments across courses 10 and 11, three distinct students
        assert_eq!(
            joined_ids(&engine.instructor_students(&Id::from("1"))),
            vec![
                Some("1".to_string()),
                Some("2".to_string()),
                Some("7".to_string())
            ]
        );
        assert_eq!(
            joined_ids(&engine.instructor_students(&Id::from("2"))),
            vec![Some("2".to_string()), None, Some("1".to_string())]
        );
        assert!(engine.instructor_students(&Id::from("3")).is_empty());
    }

    #[test]
    fn test_student_gpa_is_passed_through() {
        let engine = engine();
        let report = engine.student_gpa(&Id::from("7")).unwrap();
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"studentId": 7, "name": "Chen Wei", "gpa": 3.42})
        );

        let report = engine.student_gpa(&Id::from("4")).unwrap();
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"studentId": 4, "name": "Dana Cruz"})
        );

        let err = engine.student_gpa(&Id::from("99")).unwrap_err();
        assert_eq!(err.to_string(), "Student not found");
    }

    #[test]
    fn test_course_average_counts_unknown_letters() {
        let engine = engine();
        assert_eq!(
            engine.course_average(&Id::from("10")),
            CourseAverage::Computed {
                course_id: Id::from("10"),
                average_gpa: "2.33".to_string(),
            }
        );
        assert_eq!(
            serde_json::to_value(engine.course_average(&Id::from("11"))).unwrap(),
            json!({"courseId": "11", "averageGPA": "3.70"})
        );
    }

    #[test]
    fn test_course_average_without_grades_is_sentinel() {
        let engine = engine();
        for id in ["13", "404"] {
            assert_eq!(
                serde_json::to_value(engine.course_average(&Id::from(id))).unwrap(),
                json!({"message": "No grades available for this course"})
            );
        }
    }

    #[test]
    fn test_schedule_only_counts_exact_enrolled_status() {
        let engine = engine();
        let schedule = engine.student_schedule(&Id::from("2"));
        assert_eq!(
            schedule,
            vec![ScheduleSlot::Entry(ScheduleEntry {
                course_code: Some(&json!("CS101")),
                course_name: Some(&json!("Intro to Programming")),
                schedule: Some(&json!("MWF 9:00")),
            })]
        );
        assert!(engine.student_schedule(&Id::from("4")).is_empty());
    }

    #[test]
    fn test_schedule_reports_missing_course_per_entry() {
        let engine = engine();
        let schedule = serde_json::to_value(engine.student_schedule(&Id::from("7"))).unwrap();
        assert_eq!(
            schedule,
            json!([
                {"courseCode": "CS201", "courseName": "Data Structures", "schedule": "TTh 11:00"},
                {"message": "Course 99 not found"}
            ])
        );
    }

    #[test]
    fn test_execute_maps_queries_to_results() {
        let engine = engine();

        let result = engine.execute(&Query::StudentCourses(Id::from("7"))).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
        assert!(value[2].is_null());

        let result = engine.execute(&Query::Ping).unwrap();
        assert_eq!(result.format(), "route works!");

        let err = engine
            .execute(&Query::Get(Collection::Grades, Id::from("1")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Grade not found");
    }
}
