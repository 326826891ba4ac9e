use crate::{
    data::{
        StudentSession,
        enrollment::{Enrollment, EnrollmentDateGroup},
        student::{NewStudent, Student, StudentListQuery, StudentSummary},
    },
    error::{
        InsertStudentSnafu, MakeQuerySnafu, RegistrarResult, StudentConflictSnafu,
        UpdateStudentSnafu,
    },
};
use async_trait::async_trait;
use snafu::{ResultExt, ensure};
use sqlx::{Postgres, pool::PoolConnection};

pub struct PgStudentSession {
    conn: PoolConnection<Postgres>,
}

impl PgStudentSession {
    pub const fn new(conn: PoolConnection<Postgres>) -> Self {
        Self { conn }
    }
}

///escapes LIKE wildcards so a search for `50%` means the literal text
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl StudentSession for PgStudentSession {
    async fn find_student(&mut self, id: i32) -> RegistrarResult<Option<Student>> {
        sqlx::query_as::<_, Student>(
            "SELECT id, last_name, first_mid_name, enrollment_date, photo FROM public.students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await
        .context(MakeQuerySnafu)
    }

    async fn find_student_with_enrollments(
        &mut self,
        id: i32,
    ) -> RegistrarResult<Option<(Student, Vec<Enrollment>)>> {
        let Some(student) = self.find_student(id).await? else {
            return Ok(None);
        };

        let enrollments = sqlx::query_as::<_, Enrollment>(
            "SELECT e.enrollment_id, e.grade, c.course_id, c.title, c.credits FROM public.enrollments e INNER JOIN public.courses c ON c.course_id = e.course_id WHERE e.student_id = $1 ORDER BY c.title, e.enrollment_id",
        )
        .bind(id)
        .fetch_all(&mut *self.conn)
        .await
        .context(MakeQuerySnafu)?;

        Ok(Some((student, enrollments)))
    }

    async fn list_students(
        &mut self,
        query: &StudentListQuery,
    ) -> RegistrarResult<Vec<StudentSummary>> {
        let sql = format!(
            "SELECT id, last_name, first_mid_name, enrollment_date FROM public.students WHERE $1::text IS NULL OR last_name ILIKE $1 OR first_mid_name ILIKE $1 ORDER BY {}",
            query.sort.order_by()
        );

        sqlx::query_as::<_, StudentSummary>(&sql)
            .bind(query.search_term().map(contains_pattern))
            .fetch_all(&mut *self.conn)
            .await
            .context(MakeQuerySnafu)
    }

    async fn insert_student(&mut self, student: NewStudent) -> RegistrarResult<i32> {
        let NewStudent {
            last_name,
            first_mid_name,
            enrollment_date,
            photo,
        } = student;

        sqlx::query_scalar::<_, i32>("INSERT INTO public.students (last_name, first_mid_name, enrollment_date, photo) VALUES ($1, $2, $3, $4) RETURNING id")
            .bind(last_name)
            .bind(first_mid_name)
            .bind(enrollment_date)
            .bind(photo)
            .fetch_one(&mut *self.conn)
            .await
            .context(InsertStudentSnafu)
    }

    async fn update_student(&mut self, student: &Student) -> RegistrarResult<()> {
        let id = student.id;
        let result = sqlx::query("UPDATE public.students SET last_name = $2, first_mid_name = $3, enrollment_date = $4, photo = $5 WHERE id = $1")
            .bind(id)
            .bind(&student.last_name)
            .bind(&student.first_mid_name)
            .bind(student.enrollment_date)
            .bind(student.photo.as_deref())
            .execute(&mut *self.conn)
            .await
            .context(UpdateStudentSnafu { id })?;

        ensure!(result.rows_affected() == 1, StudentConflictSnafu { id });
        Ok(())
    }

    async fn remove_student(&mut self, id: i32) -> RegistrarResult<()> {
        let result = sqlx::query("DELETE FROM public.students WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await
            .context(UpdateStudentSnafu { id })?;

        ensure!(result.rows_affected() == 1, StudentConflictSnafu { id });
        Ok(())
    }

    async fn enrollment_date_groups(&mut self) -> RegistrarResult<Vec<EnrollmentDateGroup>> {
        sqlx::query_as::<_, EnrollmentDateGroup>(
            "SELECT enrollment_date, COUNT(*) AS student_count FROM public.students GROUP BY enrollment_date",
        )
        .fetch_all(&mut *self.conn)
        .await
        .context(MakeQuerySnafu)
    }
}
