use base64::{Engine, prelude::BASE64_STANDARD};
use chrono::NaiveDate;
use infer::MatcherType;
use serde::Deserialize;
use sqlx::FromRow;

///photos must be strictly smaller than this to be kept
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;
pub const MAX_NAME_LEN: usize = 50;
///used when the photo bytes don't sniff as any known image format
const FALLBACK_PHOTO_MIME: &str = "image/jpg";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Student {
    pub id: i32,
    pub last_name: String,
    pub first_mid_name: String,
    pub enrollment_date: NaiveDate,
    pub photo: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub last_name: String,
    pub first_mid_name: String,
    pub enrollment_date: NaiveDate,
    pub photo: Option<Vec<u8>>,
}

///what the listing page needs - no photo bytes
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StudentSummary {
    pub id: i32,
    pub last_name: String,
    pub first_mid_name: String,
    pub enrollment_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// The bytes to store, if the upload names a file and fits under [`MAX_PHOTO_BYTES`].
    ///
    /// Oversized uploads are dropped without an error.
    fn accepted_bytes(&self) -> Option<Vec<u8>> {
        if self.file_name.as_deref().is_none_or(str::is_empty) {
            return None;
        }

        if self.bytes.len() < MAX_PHOTO_BYTES {
            Some(self.bytes.clone())
        } else {
            debug!(len = self.bytes.len(), "Dropping oversized photo upload");
            None
        }
    }
}

/// The wire-facing shape of a student, only alive for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentView {
    pub id: Option<i32>,
    pub last_name: String,
    pub first_mid_name: String,
    pub enrollment_date: NaiveDate,
    pub photo_as_string: String,
    pub has_photo: bool,
    pub photo: Option<PhotoUpload>,
}

impl StudentView {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_mid_name, self.last_name)
    }
}

impl From<&Student> for StudentView {
    fn from(student: &Student) -> Self {
        Self {
            id: Some(student.id),
            last_name: student.last_name.clone(),
            first_mid_name: student.first_mid_name.clone(),
            enrollment_date: student.enrollment_date,
            photo_as_string: photo_data_uri(student.photo.as_deref()),
            has_photo: student.photo.as_ref().is_some_and(|photo| !photo.is_empty()),
            photo: None,
        }
    }
}

impl NewStudent {
    pub fn from_view(view: &StudentView) -> Self {
        Self {
            last_name: view.last_name.clone(),
            first_mid_name: view.first_mid_name.clone(),
            enrollment_date: view.enrollment_date,
            photo: view.photo.as_ref().and_then(PhotoUpload::accepted_bytes),
        }
    }
}

impl Student {
    ///copies the view's fields over this student, leaving the photo alone unless a new one was accepted
    pub fn apply_view(&mut self, view: &StudentView) {
        self.last_name.clone_from(&view.last_name);
        self.first_mid_name.clone_from(&view.first_mid_name);
        self.enrollment_date = view.enrollment_date;

        if let Some(photo) = view.photo.as_ref().and_then(PhotoUpload::accepted_bytes) {
            self.photo = Some(photo);
        }
    }
}

pub fn photo_data_uri(photo: Option<&[u8]>) -> String {
    let bytes = photo.unwrap_or_default();
    let mime = infer::get(bytes)
        .filter(|kind| kind.matcher_type() == MatcherType::Image)
        .map_or(FALLBACK_PHOTO_MIME, |kind| kind.mime_type());

    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Raw values from the student form, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentForm {
    pub last_name: String,
    pub first_mid_name: String,
    pub enrollment_date: String,
    pub photo: Option<PhotoUpload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug)]
pub struct InvalidStudentForm {
    pub form: StudentForm,
    pub errors: Vec<FieldError>,
}

impl StudentForm {
    pub fn validate(self, id: Option<i32>) -> Result<StudentView, InvalidStudentForm> {
        let mut errors = vec![];

        for (field, value, required, too_long) in [
            (
                "last_name",
                &self.last_name,
                "Last name is required",
                "Last name cannot be longer than 50 characters",
            ),
            (
                "first_mid_name",
                &self.first_mid_name,
                "First name is required",
                "First name cannot be longer than 50 characters",
            ),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError {
                    field,
                    message: required,
                });
            } else if value.chars().count() > MAX_NAME_LEN {
                errors.push(FieldError {
                    field,
                    message: too_long,
                });
            }
        }

        let enrollment_date = self.enrollment_date.trim();
        let enrollment_date = if enrollment_date.is_empty() {
            errors.push(FieldError {
                field: "enrollment_date",
                message: "Enrollment date is required",
            });
            None
        } else if let Ok(date) = NaiveDate::parse_from_str(enrollment_date, DATE_FORMAT) {
            Some(date)
        } else {
            errors.push(FieldError {
                field: "enrollment_date",
                message: "Enrollment date must be a valid date",
            });
            None
        };

        match enrollment_date {
            Some(enrollment_date) if errors.is_empty() => Ok(StudentView {
                id,
                last_name: self.last_name,
                first_mid_name: self.first_mid_name,
                enrollment_date,
                photo_as_string: photo_data_uri(None),
                has_photo: false,
                photo: self.photo,
            }),
            _ => Err(InvalidStudentForm {
                //file inputs can't be refilled, so don't hold onto the bytes
                form: Self { photo: None, ..self },
                errors,
            }),
        }
    }
}

impl From<&StudentView> for StudentForm {
    fn from(view: &StudentView) -> Self {
        Self {
            last_name: view.last_name.clone(),
            first_mid_name: view.first_mid_name.clone(),
            enrollment_date: view.enrollment_date.format(DATE_FORMAT).to_string(),
            photo: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentOrder {
    #[default]
    NameAsc,
    NameDesc,
    DateAsc,
    DateDesc,
}

impl StudentOrder {
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::NameAsc => "last_name ASC, first_mid_name ASC, id ASC",
            Self::NameDesc => "last_name DESC, first_mid_name DESC, id DESC",
            Self::DateAsc => "enrollment_date ASC, id ASC",
            Self::DateDesc => "enrollment_date DESC, id DESC",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
            Self::DateAsc => "date_asc",
            Self::DateDesc => "date_desc",
        }
    }

    ///where clicking the name column header goes
    pub const fn toggle_name(self) -> Self {
        match self {
            Self::NameAsc => Self::NameDesc,
            _ => Self::NameAsc,
        }
    }

    pub const fn toggle_date(self) -> Self {
        match self {
            Self::DateAsc => Self::DateDesc,
            _ => Self::DateAsc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StudentListQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub sort: StudentOrder,
}

impl StudentListQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn upload(name: &str, len: usize) -> PhotoUpload {
        PhotoUpload {
            file_name: Some(name.to_string()),
            bytes: vec![7; len],
        }
    }

    fn form(photo: Option<PhotoUpload>) -> StudentForm {
        StudentForm {
            last_name: "Alonso".into(),
            first_mid_name: "Ana".into(),
            enrollment_date: "2023-09-01".into(),
            photo,
        }
    }

    fn existing() -> Student {
        Student {
            id: 3,
            last_name: "Anand".into(),
            first_mid_name: "Arturo".into(),
            enrollment_date: date(2019, 9, 1),
            photo: Some(vec![1, 2, 3]),
        }
    }

    #[test]
    fn valid_form_becomes_view() {
        let view = form(None).validate(None).unwrap();
        assert_eq!(view.last_name, "Alonso");
        assert_eq!(view.first_mid_name, "Ana");
        assert_eq!(view.enrollment_date, date(2023, 9, 1));
        assert_eq!(view.id, None);
    }

    #[test]
    fn invalid_form_keeps_values_and_lists_every_problem() {
        let bad = StudentForm {
            last_name: "   ".into(),
            first_mid_name: "x".repeat(51),
            enrollment_date: "01/09/2023".into(),
            photo: Some(upload("me.jpg", 10)),
        };

        let InvalidStudentForm { form, errors } = bad.validate(None).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["last_name", "first_mid_name", "enrollment_date"]);
        assert_eq!(form.last_name, "   ");
        assert_eq!(form.enrollment_date, "01/09/2023");
        assert!(form.photo.is_none());
    }

    #[test]
    fn fifty_character_names_are_fine() {
        let mut long = form(None);
        long.last_name = "é".repeat(MAX_NAME_LEN);
        assert!(long.validate(None).is_ok());
    }

    #[test]
    fn missing_date_is_required_error() {
        let mut no_date = form(None);
        no_date.enrollment_date = String::new();
        let errors = no_date.validate(None).unwrap_err().errors;
        assert_eq!(
            errors,
            [FieldError {
                field: "enrollment_date",
                message: "Enrollment date is required"
            }]
        );
    }

    #[test]
    fn new_student_without_upload_has_no_photo() {
        let view = form(None).validate(None).unwrap();
        let student = NewStudent::from_view(&view);
        assert_eq!(
            student,
            NewStudent {
                last_name: "Alonso".into(),
                first_mid_name: "Ana".into(),
                enrollment_date: date(2023, 9, 1),
                photo: None,
            }
        );
    }

    #[test]
    fn upload_without_file_name_is_ignored() {
        let blank = PhotoUpload {
            file_name: Some(String::new()),
            bytes: vec![1, 2],
        };
        let view = form(Some(blank)).validate(None).unwrap();
        assert_eq!(NewStudent::from_view(&view).photo, None);

        let nameless = PhotoUpload {
            file_name: None,
            bytes: vec![1, 2],
        };
        let view = form(Some(nameless)).validate(None).unwrap();
        assert_eq!(NewStudent::from_view(&view).photo, None);
    }

    #[test]
    fn photo_cap_is_exclusive() {
        let view = form(Some(upload("small.jpg", MAX_PHOTO_BYTES - 1)))
            .validate(None)
            .unwrap();
        assert_eq!(
            NewStudent::from_view(&view).photo.map(|p| p.len()),
            Some(MAX_PHOTO_BYTES - 1)
        );

        let view = form(Some(upload("big.jpg", MAX_PHOTO_BYTES)))
            .validate(None)
            .unwrap();
        assert_eq!(NewStudent::from_view(&view).photo, None);
    }

    #[test]
    fn oversized_upload_keeps_existing_photo() {
        let mut student = existing();
        let view = form(Some(upload("huge.png", MAX_PHOTO_BYTES + 10)))
            .validate(Some(3))
            .unwrap();
        student.apply_view(&view);

        assert_eq!(student.photo, Some(vec![1, 2, 3]));
        assert_eq!(student.last_name, "Alonso");
        assert_eq!(student.id, 3);
    }

    #[test]
    fn accepted_upload_replaces_photo() {
        let mut student = existing();
        let view = form(Some(upload("new.jpg", 5))).validate(Some(3)).unwrap();
        student.apply_view(&view);

        assert_eq!(student.photo, Some(vec![7; 5]));
    }

    #[test]
    fn unchanged_round_trip_is_lossless() {
        let original = existing();
        let view = StudentView::from(&original);
        let resubmitted = StudentForm::from(&view).validate(view.id).unwrap();

        let mut student = original.clone();
        student.apply_view(&resubmitted);
        assert_eq!(student, original);
    }

    #[test]
    fn empty_photo_gets_jpg_prefix() {
        assert_eq!(photo_data_uri(None), "data:image/jpg;base64,");

        let view = StudentView::from(&Student {
            photo: None,
            ..existing()
        });
        assert!(!view.has_photo);
        assert!(StudentView::from(&existing()).has_photo);
    }

    #[test]
    fn unknown_bytes_fall_back_to_jpg() {
        assert_eq!(photo_data_uri(Some(&[1, 2, 3])), "data:image/jpg;base64,AQID");
    }

    #[test]
    fn png_is_sniffed() {
        let uri = photo_data_uri(Some(&PNG_MAGIC));
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(
            BASE64_STANDARD
                .decode(uri.trim_start_matches("data:image/png;base64,"))
                .unwrap(),
            PNG_MAGIC
        );
    }

    #[test]
    fn search_term_ignores_whitespace() {
        let query = StudentListQuery {
            search: Some("  ".into()),
            sort: StudentOrder::default(),
        };
        assert_eq!(query.search_term(), None);

        let query = StudentListQuery {
            search: Some(" ana ".into()),
            sort: StudentOrder::DateDesc,
        };
        assert_eq!(query.search_term(), Some("ana"));
    }

    #[test]
    fn sort_headers_toggle() {
        assert_eq!(StudentOrder::NameAsc.toggle_name(), StudentOrder::NameDesc);
        assert_eq!(StudentOrder::NameDesc.toggle_name(), StudentOrder::NameAsc);
        assert_eq!(StudentOrder::NameAsc.toggle_date(), StudentOrder::DateAsc);
        assert_eq!(StudentOrder::DateAsc.toggle_date(), StudentOrder::DateDesc);
    }
}
