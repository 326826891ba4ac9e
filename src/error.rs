use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use snafu::Snafu;
use std::num::ParseIntError;

pub type RegistrarResult<T> = Result<T, RegistrarError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistrarError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error adding new student"))]
    InsertStudent { source: sqlx::Error },
    #[snafu(display("Error saving changes to student {}", id))]
    UpdateStudent { source: sqlx::Error, id: i32 },
    #[snafu(display("Student {} was changed or removed before the save finished", id))]
    StudentConflict { id: i32 },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a number", name))]
    ParseNumber {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("No student ID was provided"))]
    MissingStudentId,
    #[snafu(display("Unable to find student with ID: {}", id))]
    MissingStudent { id: i32 },
    #[snafu(display("Error with multipart form input"))]
    Multipart {
        source: axum::extract::multipart::MultipartError,
    },
}

impl RegistrarError {
    /// Write failures the user can retry, as opposed to broken infrastructure.
    pub const fn is_save_failure(&self) -> bool {
        matches!(
            self,
            Self::UpdateStudent { .. } | Self::StudentConflict { .. }
        )
    }

    pub fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const CF: StatusCode = StatusCode::CONFLICT; //conflict

        match self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MigrateError { .. } => ISE,
            Self::MakeQuery { .. } | Self::InsertStudent { .. } => ISE,
            Self::UpdateStudent { .. } => ISE,
            Self::StudentConflict { .. } => CF,
            Self::BadEnvVar { .. } | Self::ParseNumber { .. } => ISE,
            Self::MissingStudentId | Self::MissingStudent { .. } => NF,
            Self::Multipart { source } => source.status(),
        }
    }
}

impl IntoResponse for RegistrarError {
    fn into_response(self) -> Response {
        let basic_error = |desc| {
            html! {
                div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                    strong class="font-bold" {"Registrar Error "}
                    span {(desc)}
                }
            }
        };

        let status_code = self.status_code();
        if status_code.is_server_error() {
            error!(?self, "Error!");
        } else {
            warn!(?self, "Request failed");
        }

        (status_code, Html(basic_error(self.to_string()))).into_response()
    }
}
