//! An in-memory [`StudentSession`] for exercising the handlers without Postgres.

use crate::{
    data::{
        StudentSession,
        enrollment::{Course, Enrollment, EnrollmentDateGroup, Grade},
        student::{NewStudent, Student, StudentListQuery, StudentOrder, StudentSummary},
    },
    error::{RegistrarError, RegistrarResult, StudentConflictSnafu},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};

#[derive(Default)]
struct MemoryDb {
    students: BTreeMap<i32, Student>,
    enrollments: Vec<(i32, Enrollment)>,
    next_id: i32,
    fail_writes: bool,
}

/// Clones share the same data, so a test can keep one and hand the other to a handler.
#[derive(Clone, Default)]
pub struct MemorySession {
    db: Arc<Mutex<MemoryDb>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_student(&self, last_name: &str, first_mid_name: &str, enrollment_date: NaiveDate) -> i32 {
        let mut db = self.db.lock();
        db.next_id += 1;
        let id = db.next_id;
        db.students.insert(
            id,
            Student {
                id,
                last_name: last_name.to_string(),
                first_mid_name: first_mid_name.to_string(),
                enrollment_date,
                photo: None,
            },
        );
        id
    }

    pub fn set_photo(&self, id: i32, photo: Vec<u8>) {
        if let Some(student) = self.db.lock().students.get_mut(&id) {
            student.photo = Some(photo);
        }
    }

    pub fn enroll(&self, student_id: i32, course: Course, grade: Option<Grade>) -> i32 {
        let mut db = self.db.lock();
        let id = i32::try_from(db.enrollments.len()).unwrap_or(i32::MAX) + 1;
        db.enrollments.push((student_id, Enrollment { id, grade, course }));
        id
    }

    ///makes every later insert, update and remove fail like a rejected save
    pub fn fail_writes(&self) {
        self.db.lock().fail_writes = true;
    }

    pub fn student(&self, id: i32) -> Option<Student> {
        self.db.lock().students.get(&id).cloned()
    }

    pub fn students(&self) -> Vec<Student> {
        self.db.lock().students.values().cloned().collect()
    }

    fn check_writable(db: &MemoryDb, id: i32) -> RegistrarResult<()> {
        if db.fail_writes {
            return Err(RegistrarError::UpdateStudent {
                source: sqlx::Error::Protocol("simulated save failure".into()),
                id,
            });
        }
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[async_trait]
impl StudentSession for MemorySession {
    async fn find_student(&mut self, id: i32) -> RegistrarResult<Option<Student>> {
        Ok(self.student(id))
    }

    async fn find_student_with_enrollments(
        &mut self,
        id: i32,
    ) -> RegistrarResult<Option<(Student, Vec<Enrollment>)>> {
        let db = self.db.lock();
        Ok(db.students.get(&id).cloned().map(|student| {
            let enrollments = db
                .enrollments
                .iter()
                .filter(|(student_id, _)| *student_id == id)
                .map(|(_, enrollment)| enrollment.clone())
                .collect();
            (student, enrollments)
        }))
    }

    async fn list_students(
        &mut self,
        query: &StudentListQuery,
    ) -> RegistrarResult<Vec<StudentSummary>> {
        let needle = query.search_term().map(str::to_lowercase);
        let mut found: Vec<_> = self
            .students()
            .into_iter()
            .filter(|s| {
                needle.as_ref().is_none_or(|needle| {
                    s.last_name.to_lowercase().contains(needle)
                        || s.first_mid_name.to_lowercase().contains(needle)
                })
            })
            .map(|s| StudentSummary {
                id: s.id,
                last_name: s.last_name,
                first_mid_name: s.first_mid_name,
                enrollment_date: s.enrollment_date,
            })
            .collect();

        match query.sort {
            StudentOrder::NameAsc => found.sort_by(|a, b| {
                (&a.last_name, &a.first_mid_name, a.id).cmp(&(&b.last_name, &b.first_mid_name, b.id))
            }),
            StudentOrder::NameDesc => found.sort_by(|a, b| {
                (&b.last_name, &b.first_mid_name, b.id).cmp(&(&a.last_name, &a.first_mid_name, a.id))
            }),
            StudentOrder::DateAsc => found.sort_by_key(|s| (s.enrollment_date, s.id)),
            StudentOrder::DateDesc => {
                found.sort_by_key(|s| (s.enrollment_date, s.id));
                found.reverse();
            }
        }

        Ok(found)
    }

    async fn insert_student(&mut self, student: NewStudent) -> RegistrarResult<i32> {
        let mut db = self.db.lock();
        Self::check_writable(&db, 0)?;

        db.next_id += 1;
        let id = db.next_id;
        let NewStudent {
            last_name,
            first_mid_name,
            enrollment_date,
            photo,
        } = student;
        db.students.insert(
            id,
            Student {
                id,
                last_name,
                first_mid_name,
                enrollment_date,
                photo,
            },
        );
        Ok(id)
    }

    async fn update_student(&mut self, student: &Student) -> RegistrarResult<()> {
        let mut db = self.db.lock();
        Self::check_writable(&db, student.id)?;

        let stored = db
            .students
            .get_mut(&student.id)
            .ok_or(RegistrarError::StudentConflict { id: student.id })?;
        *stored = student.clone();
        Ok(())
    }

    async fn remove_student(&mut self, id: i32) -> RegistrarResult<()> {
        let mut db = self.db.lock();
        Self::check_writable(&db, id)?;

        snafu::ensure!(db.students.remove(&id).is_some(), StudentConflictSnafu { id });
        db.enrollments.retain(|(student_id, _)| *student_id != id);
        Ok(())
    }

    async fn enrollment_date_groups(&mut self) -> RegistrarResult<Vec<EnrollmentDateGroup>> {
        let mut counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for student in self.db.lock().students.values() {
            *counts.entry(student.enrollment_date).or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(enrollment_date, student_count)| EnrollmentDateGroup {
                enrollment_date,
                student_count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_students_come_back_empty() {
        let mut session = MemorySession::new();
        assert!(session.find_student(1).await.unwrap().is_none());
        assert!(
            session
                .find_student_with_enrollments(1)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn failed_writes_are_save_failures() {
        let mut session = MemorySession::new();
        let id = session.add_student("Li", "Yan", date(2021, 9, 1));
        session.fail_writes();

        let e = session.remove_student(id).await.unwrap_err();
        assert!(e.is_save_failure());
        assert!(session.student(id).is_some());
    }

    #[tokio::test]
    async fn removing_twice_is_a_conflict() {
        let mut session = MemorySession::new();
        let id = session.add_student("Li", "Yan", date(2021, 9, 1));
        session.remove_student(id).await.unwrap();

        assert!(matches!(
            session.remove_student(id).await,
            Err(RegistrarError::StudentConflict { .. })
        ));
    }
}
