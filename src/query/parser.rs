// Path Parser
// This module converts API paths such as "/api/students/7/courses" into
// structured queries the engine can execute

use super::QueryError;
use crate::storage::Id;

/// The six entity collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Students,
    Instructors,
    Courses,
    Enrollments,
    Assignments,
    Grades,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Students,
        Collection::Instructors,
        Collection::Courses,
        Collection::Enrollments,
        Collection::Assignments,
        Collection::Grades,
    ];

    /// The path segment naming this collection
    pub fn segment(self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Instructors => "instructors",
            Collection::Courses => "courses",
            Collection::Enrollments => "enrollments",
            Collection::Assignments => "assignments",
            Collection::Grades => "grades",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.segment() == segment)
    }
}

/// Represents the different queries the API answers
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// GET /data
    Dump,
    /// GET /route
    Ping,
    /// GET /api/{collection}
    List(Collection),
    /// GET /api/{collection}/{id}
    Get(Collection, Id),
    /// GET /api/students/{id}/enrollments
    StudentEnrollments(Id),
    /// GET /api/students/{id}/courses
    StudentCourses(Id),
    /// GET /api/courses/{id}/students
    CourseStudents(Id),
    /// GET /api/instructors/{id}/courses
    InstructorCourses(Id),
    /// GET /api/courses/{id}/assignments
    CourseAssignments(Id),
    /// GET /api/enrollments/{id}/grades
    EnrollmentGrades(Id),
    /// GET /api/students/{id}/gpa
    StudentGpa(Id),
    /// GET /api/courses/{id}/average
    CourseAverage(Id),
    /// GET /api/instructors/{id}/students
    InstructorStudents(Id),
    /// GET /api/students/{id}/schedule
    StudentSchedule(Id),
}

/// Relationship and statistic queries, served at `/api/{collection}/{id}/{relation}`
pub const RELATIONS: [(Collection, &str, fn(Id) -> Query); 10] = [
    (Collection::Students, "enrollments", Query::StudentEnrollments),
    (Collection::Students, "courses", Query::StudentCourses),
    (Collection::Students, "gpa", Query::StudentGpa),
    (Collection::Students, "schedule", Query::StudentSchedule),
    (Collection::Courses, "students", Query::CourseStudents),
    (Collection::Courses, "assignments", Query::CourseAssignments),
    (Collection::Courses, "average", Query::CourseAverage),
    (Collection::Instructors, "courses", Query::InstructorCourses),
    (Collection::Instructors, "students", Query::InstructorStudents),
    (Collection::Enrollments, "grades", Query::EnrollmentGrades),
];

/// The path parser
pub struct QueryParser;

impl QueryParser {
    /// Parse an API path into a Query
    /// A query string and a trailing slash are ignored
    pub fn parse(path: &str) -> Result<Query, QueryError> {
        let unknown = || QueryError::UnknownRoute(path.to_string());

        let path = path.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path
            .trim()
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split('/')
            .collect();

        match segments.as_slice() {
            ["data"] => Ok(Query::Dump),
            ["route"] => Ok(Query::Ping),
            ["api", collection] => Collection::from_segment(collection)
                .map(Query::List)
                .ok_or_else(unknown),
            ["api", collection, id] if !id.is_empty() => Collection::from_segment(collection)
                .map(|c| Query::Get(c, Id::from(*id)))
                .ok_or_else(unknown),
            ["api", collection, id, relation] if !id.is_empty() => RELATIONS
                .iter()
                .find(|(c, r, _)| c.segment() == *collection && r == relation)
                .map(|(_, _, build)| build(Id::from(*id)))
                .ok_or_else(unknown),
            _ => Err(unknown()),
        }
    }
}
