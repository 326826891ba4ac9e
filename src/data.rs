use crate::error::RegistrarResult;
use async_trait::async_trait;
use enrollment::{Enrollment, EnrollmentDateGroup};
use serde::{Deserialize, Deserializer, de::Error as _};
use student::{NewStudent, Student, StudentListQuery, StudentSummary};

pub mod enrollment;
#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod student;

#[derive(Deserialize)]
pub struct IdForm {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<i32>,
}

///`?id=` arrives as an empty string, which means no id at all
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;

    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => id
            .parse()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid student id {id:?}: {e}"))),
    }
}

/// One request's view of the student store.
///
/// Every write is saved by the time the call returns. Write failures that the user
/// could retry come back as [`crate::error::RegistrarError::is_save_failure`] errors.
#[async_trait]
pub trait StudentSession: Send {
    async fn find_student(&mut self, id: i32) -> RegistrarResult<Option<Student>>;

    ///the student, plus every enrollment with its course
    async fn find_student_with_enrollments(
        &mut self,
        id: i32,
    ) -> RegistrarResult<Option<(Student, Vec<Enrollment>)>>;

    async fn list_students(
        &mut self,
        query: &StudentListQuery,
    ) -> RegistrarResult<Vec<StudentSummary>>;

    async fn insert_student(&mut self, student: NewStudent) -> RegistrarResult<i32>;

    async fn update_student(&mut self, student: &Student) -> RegistrarResult<()>;

    async fn remove_student(&mut self, id: i32) -> RegistrarResult<()>;

    async fn enrollment_date_groups(&mut self) -> RegistrarResult<Vec<EnrollmentDateGroup>>;
}
