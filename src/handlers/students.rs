use crate::{
    data::{
        StudentSession,
        enrollment::Enrollment,
        student::{
            FieldError, InvalidStudentForm, NewStudent, Student, StudentForm, StudentListQuery,
            StudentSummary, StudentView,
        },
    },
    error::{MissingStudentIdSnafu, MissingStudentSnafu, RegistrarResult},
    handlers::{Destination, Next},
};
use snafu::OptionExt;

pub const DELETE_FAILED_MESSAGE: &str = "Delete failed. Try again";
pub const SAVE_FAILED_MESSAGE: &str = "Save failed. Try again";

#[derive(Debug)]
pub struct StudentListPage {
    pub students: Vec<StudentSummary>,
    pub query: StudentListQuery,
}

#[derive(Debug, Default)]
pub struct CreateStudentPage {
    pub form: StudentForm,
    pub errors: Vec<FieldError>,
}

#[derive(Debug)]
pub struct DeleteStudentPage {
    pub student: StudentView,
    pub error_message: Option<&'static str>,
}

#[derive(Debug)]
pub struct StudentDetailsPage {
    pub student: StudentView,
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug)]
pub struct EditStudentPage {
    pub student: StudentView,
    pub form: StudentForm,
    pub errors: Vec<FieldError>,
    pub error_message: Option<&'static str>,
}

impl EditStudentPage {
    fn new(student: &Student) -> Self {
        let student = StudentView::from(student);
        Self {
            form: StudentForm::from(&student),
            student,
            errors: vec![],
            error_message: None,
        }
    }
}

/// Create, delete, details, edit and listing for students.
///
/// Built fresh for every request around that request's session.
pub struct StudentRecordHandler<S> {
    session: S,
}

impl<S: StudentSession> StudentRecordHandler<S> {
    pub const fn new(session: S) -> Self {
        Self { session }
    }

    async fn load(&mut self, id: Option<i32>) -> RegistrarResult<Student> {
        let id = id.context(MissingStudentIdSnafu)?;
        self.session
            .find_student(id)
            .await?
            .context(MissingStudentSnafu { id })
    }

    pub async fn render_list(&mut self, query: StudentListQuery) -> RegistrarResult<StudentListPage> {
        let students = self.session.list_students(&query).await?;
        Ok(StudentListPage { students, query })
    }

    pub fn render_create_form() -> CreateStudentPage {
        CreateStudentPage::default()
    }

    pub async fn submit_create(
        &mut self,
        form: StudentForm,
    ) -> RegistrarResult<Next<CreateStudentPage>> {
        let view = match form.validate(None) {
            Ok(view) => view,
            Err(InvalidStudentForm { form, errors }) => {
                return Ok(Next::Render(CreateStudentPage { form, errors }));
            }
        };

        let id = self
            .session
            .insert_student(NewStudent::from_view(&view))
            .await?;
        info!(id, "Added new student");

        Ok(Next::Redirect(Destination::StudentList))
    }

    pub async fn render_delete_confirmation(
        &mut self,
        id: Option<i32>,
        save_changes_error: bool,
    ) -> RegistrarResult<DeleteStudentPage> {
        let student = self.load(id).await?;

        Ok(DeleteStudentPage {
            student: StudentView::from(&student),
            error_message: save_changes_error.then_some(DELETE_FAILED_MESSAGE),
        })
    }

    pub async fn submit_delete(&mut self, id: Option<i32>) -> RegistrarResult<Destination> {
        let Student { id, .. } = self.load(id).await?;

        match self.session.remove_student(id).await {
            Ok(()) => {
                info!(id, "Removed student");
                Ok(Destination::StudentList)
            }
            Err(e) if e.is_save_failure() => {
                info!(?e, id, "Unable to remove student");
                Ok(Destination::DeleteConfirmation {
                    id,
                    save_changes_error: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn render_details(&mut self, id: Option<i32>) -> RegistrarResult<StudentDetailsPage> {
        let id = id.context(MissingStudentIdSnafu)?;
        let (student, enrollments) = self
            .session
            .find_student_with_enrollments(id)
            .await?
            .context(MissingStudentSnafu { id })?;

        Ok(StudentDetailsPage {
            student: StudentView::from(&student),
            enrollments,
        })
    }

    pub async fn render_edit_form(&mut self, id: Option<i32>) -> RegistrarResult<EditStudentPage> {
        let student = self.load(id).await?;
        Ok(EditStudentPage::new(&student))
    }

    pub async fn submit_edit(
        &mut self,
        id: Option<i32>,
        form: StudentForm,
    ) -> RegistrarResult<Next<EditStudentPage>> {
        let student = self.load(id).await?;

        let view = match form.validate(Some(student.id)) {
            Ok(view) => view,
            Err(InvalidStudentForm { form, errors }) => {
                return Ok(Next::Render(EditStudentPage {
                    form,
                    errors,
                    ..EditStudentPage::new(&student)
                }));
            }
        };

        let mut updated = student.clone();
        updated.apply_view(&view);

        match self.session.update_student(&updated).await {
            Ok(()) => {
                info!(id = student.id, "Updated student");
                Ok(Next::Redirect(Destination::StudentList))
            }
            Err(e) if e.is_save_failure() => {
                info!(?e, id = student.id, "Unable to save student");
                //the page still shows what is stored, the form keeps what was typed
                Ok(Next::Render(EditStudentPage {
                    form: StudentForm::from(&view),
                    error_message: Some(SAVE_FAILED_MESSAGE),
                    ..EditStudentPage::new(&student)
                }))
            }
            Err(e) => Err(e),
        }
    }
}
