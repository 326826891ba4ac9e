use crate::{
    data::{
        IdForm, deserialize_optional_id,
        postgres::PgStudentSession,
        student::{
            FieldError, PhotoUpload, StudentForm, StudentListQuery, StudentOrder, StudentView,
        },
    },
    error::{MultipartSnafu, RegistrarResult},
    handlers::{
        Next,
        students::{
            CreateStudentPage, DeleteStudentPage, EditStudentPage, StudentDetailsPage,
            StudentListPage, StudentRecordHandler,
        },
    },
    maud_conveniences::{
        alert, errors_list, form_element, form_submit_button, render_table, simple_form_element,
        title,
    },
    state::RegistrarState,
};
use axum::{
    extract::{Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::ResultExt;

const DISPLAY_DATE_FORMAT: &str = "%d %B %Y";

async fn read_student_form(mut multipart: Multipart) -> RegistrarResult<StudentForm> {
    let mut form = StudentForm::default();

    while let Some(field) = multipart.next_field().await.context(MultipartSnafu)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "last_name" => form.last_name = field.text().await.context(MultipartSnafu)?,
            "first_mid_name" => form.first_mid_name = field.text().await.context(MultipartSnafu)?,
            "enrollment_date" => {
                form.enrollment_date = field.text().await.context(MultipartSnafu)?;
            }
            "photo" => {
                let file_name = field.file_name().map(ToOwned::to_owned);
                let bytes = field.bytes().await.context(MultipartSnafu)?;
                form.photo = Some(PhotoUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {
                debug!(?name, "Ignoring unknown student form field");
            }
        }
    }

    Ok(form)
}

fn student_form(
    action: &str,
    form: &StudentForm,
    errors: &[FieldError],
    submit_label: &'static str,
) -> Markup {
    html! {
        @if !errors.is_empty() {
            (errors_list(
                Some("Please fix the following:"),
                errors.iter().map(|e| html! { span data-field=(e.field) {(e.message)} }),
            ))
        }
        form method="post" action=(action) enctype="multipart/form-data" class="p-4" {
            (simple_form_element("last_name", "Last Name", true, None, Some(form.last_name.as_str())))
            (simple_form_element("first_mid_name", "First Name", true, None, Some(form.first_mid_name.as_str())))
            (simple_form_element("enrollment_date", "Enrollment Date", true, Some("date"), Some(form.enrollment_date.as_str())))
            (form_element("photo", "Photo (optional, under 2 MiB)", html!{
                input type="file" id="photo" name="photo" accept="image/*" class="block w-full text-sm text-gray-300 file:mr-4 file:py-2 file:px-4 file:rounded file:border-0 file:text-sm file:font-semibold file:bg-violet-50 file:text-violet-700 hover:file:bg-violet-100 mb-4";
            }))

            (form_submit_button(Some(submit_label)))
        }
    }
}

fn student_summary(student: &StudentView) -> Markup {
    html! {
        div class="flex flex-row space-x-6 mb-4" {
            @if student.has_photo {
                img src=(student.photo_as_string) alt={"Photo of " (student.full_name())} class="w-32 h-32 object-cover rounded" {}
            }
            dl class="grid grid-cols-2 gap-x-4 gap-y-2" {
                dt class="text-gray-300 text-sm" {"Last Name"}
                dd class="text-gray-100" {(student.last_name)}
                dt class="text-gray-300 text-sm" {"First Name"}
                dd class="text-gray-100" {(student.first_mid_name)}
                dt class="text-gray-300 text-sm" {"Enrollment Date"}
                dd class="text-gray-100" {(student.enrollment_date.format(DISPLAY_DATE_FORMAT).to_string())}
            }
        }
    }
}

fn card(markup: Markup) -> Markup {
    html! {
        div class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-4xl w-full flex flex-col space-y-4" {
            (markup)
        }
    }
}

fn back_to_list() -> Markup {
    html! {
        a href="/students" class="text-blue-400 hover:underline" {"Back to List"}
    }
}

pub fn render_student_list(StudentListPage { students, query }: StudentListPage) -> Markup {
    let search = query.search_term().unwrap_or_default();
    let sort_link = |order: StudentOrder| {
        format!("/students?sort={}&search={}", order.as_str(), urlencoding::encode(search))
    };

    let rows = students
        .into_iter()
        .map(|student| {
            [
                html! {(student.last_name)},
                html! {(student.first_mid_name)},
                html! {(student.enrollment_date.format(DISPLAY_DATE_FORMAT).to_string())},
                html! {
                    div class="flex flex-row space-x-2" {
                        a href={"/students/edit?id=" (student.id)} class="text-blue-400 hover:underline" {"Edit"}
                        a href={"/students/details?id=" (student.id)} class="text-blue-400 hover:underline" {"Details"}
                        a href={"/students/delete?id=" (student.id)} class="text-red-400 hover:underline" {"Delete"}
                    }
                },
            ]
        })
        .collect();

    card(html! {
        div class="flex flex-row items-center justify-between" {
            form method="get" action="/students" class="flex flex-row space-x-2" {
                input type="hidden" name="sort" value=(query.sort.as_str());
                input type="text" name="search" value=(search) placeholder="Find by name" class="shadow appearance-none border rounded py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600";
                button type="submit" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {"Search"}
                a href="/students" class="py-2 px-4 text-blue-400 hover:underline" {"Show all"}
            }
            a href="/students/create" class="bg-blue-600 hover:bg-blue-800 font-bold py-2 px-4 rounded" {"Create New"}
        }
        (render_table(
            "Students",
            [
                html! { a href=(sort_link(query.sort.toggle_name())) class="hover:underline" {"Last Name"} },
                html! {"First Name"},
                html! { a href=(sort_link(query.sort.toggle_date())) class="hover:underline" {"Enrollment Date"} },
                html! {},
            ],
            rows,
        ))
    })
}

pub fn render_create_student(CreateStudentPage { form, errors }: CreateStudentPage) -> Markup {
    card(html! {
        (title("Create Student"))
        (student_form("/students/create", &form, &errors, "Create"))
        (back_to_list())
    })
}

pub fn render_delete_student(
    DeleteStudentPage {
        student,
        error_message,
    }: DeleteStudentPage,
) -> Markup {
    let id = student.id.unwrap_or_default();

    card(html! {
        (title("Delete Student"))
        @if let Some(error_message) = error_message {
            (alert(error_message))
        }
        p class="text-lg" {"Are you sure you want to delete this?"}
        (student_summary(&student))
        form method="post" action={"/students/delete?id=" (id)} class="flex flex-row items-center space-x-4" {
            button type="submit" class="bg-red-600 hover:bg-red-800 font-bold py-2 px-4 rounded" {"Delete"}
            (back_to_list())
        }
    })
}

pub fn render_student_details(
    StudentDetailsPage {
        student,
        enrollments,
    }: StudentDetailsPage,
) -> Markup {
    let id = student.id.unwrap_or_default();
    let rows = enrollments
        .into_iter()
        .map(|enrollment| {
            [
                html! {(enrollment.course.course_id)},
                html! { span title={"Enrollment #" (enrollment.id)} {(enrollment.course.title)} },
                html! {(enrollment.course.credits)},
                html! {
                    @match enrollment.grade {
                        Some(grade) => { (grade) }
                        None => { span class="text-gray-500 italic" {"No grade"} }
                    }
                },
            ]
        })
        .collect();

    card(html! {
        (title("Student Details"))
        (student_summary(&student))
        (render_table(
            "Enrollments",
            [
                html! {"Number"},
                html! {"Course Title"},
                html! {"Credits"},
                html! {"Grade"},
            ],
            rows,
        ))
        div class="flex flex-row space-x-4" {
            a href={"/students/edit?id=" (id)} class="text-blue-400 hover:underline" {"Edit"}
            (back_to_list())
        }
    })
}

pub fn render_edit_student(
    EditStudentPage {
        student,
        form,
        errors,
        error_message,
    }: EditStudentPage,
) -> Markup {
    let action = format!("/students/edit?id={}", student.id.unwrap_or_default());

    card(html! {
        (title("Edit Student"))
        @if let Some(error_message) = error_message {
            (alert(error_message))
        }
        @if student.has_photo {
            img src=(student.photo_as_string) alt="Current photo" class="w-32 h-32 object-cover rounded" {}
        }
        (student_form(&action, &form, &errors, "Save"))
        (back_to_list())
    })
}

pub async fn get_students(
    State(state): State<RegistrarState>,
    Query(query): Query<StudentListQuery>,
) -> RegistrarResult<Markup> {
    let page = StudentRecordHandler::new(state.student_session().await?)
        .render_list(query)
        .await?;
    Ok(state.render(render_student_list(page)))
}

pub async fn get_create_student(State(state): State<RegistrarState>) -> Markup {
    let page = StudentRecordHandler::<PgStudentSession>::render_create_form();
    state.render(render_create_student(page))
}

pub async fn post_create_student(
    State(state): State<RegistrarState>,
    multipart: Multipart,
) -> RegistrarResult<Response> {
    let form = read_student_form(multipart).await?;

    Ok(
        match StudentRecordHandler::new(state.student_session().await?)
            .submit_create(form)
            .await?
        {
            Next::Render(page) => state.render(render_create_student(page)).into_response(),
            Next::Redirect(destination) => Redirect::to(&destination.uri()).into_response(),
        },
    )
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<i32>,
    #[serde(default)]
    pub save_changes_error: bool,
}

pub async fn get_delete_student(
    State(state): State<RegistrarState>,
    Query(DeleteQuery {
        id,
        save_changes_error,
    }): Query<DeleteQuery>,
) -> RegistrarResult<Markup> {
    let page = StudentRecordHandler::new(state.student_session().await?)
        .render_delete_confirmation(id, save_changes_error)
        .await?;
    Ok(state.render(render_delete_student(page)))
}

pub async fn post_delete_student(
    State(state): State<RegistrarState>,
    Query(IdForm { id }): Query<IdForm>,
) -> RegistrarResult<Redirect> {
    let destination = StudentRecordHandler::new(state.student_session().await?)
        .submit_delete(id)
        .await?;
    Ok(Redirect::to(&destination.uri()))
}

pub async fn get_student_details(
    State(state): State<RegistrarState>,
    Query(IdForm { id }): Query<IdForm>,
) -> RegistrarResult<Markup> {
    let page = StudentRecordHandler::new(state.student_session().await?)
        .render_details(id)
        .await?;
    Ok(state.render(render_student_details(page)))
}

pub async fn get_edit_student(
    State(state): State<RegistrarState>,
    Query(IdForm { id }): Query<IdForm>,
) -> RegistrarResult<Markup> {
    let page = StudentRecordHandler::new(state.student_session().await?)
        .render_edit_form(id)
        .await?;
    Ok(state.render(render_edit_student(page)))
}

pub async fn post_edit_student(
    State(state): State<RegistrarState>,
    Query(IdForm { id }): Query<IdForm>,
    multipart: Multipart,
) -> RegistrarResult<Response> {
    let form = read_student_form(multipart).await?;

    Ok(
        match StudentRecordHandler::new(state.student_session().await?)
            .submit_edit(id, form)
            .await?
        {
            Next::Render(page) => state.render(render_edit_student(page)).into_response(),
            Next::Redirect(destination) => Redirect::to(&destination.uri()).into_response(),
        },
    )
}
