use chrono::NaiveDate;
use sqlx::FromRow;
use maud::Render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "grade")]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const fn letter(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl Render for Grade {
    fn render_to(&self, buffer: &mut String) {
        buffer.push_str(self.letter());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Course {
    pub course_id: i32,
    pub title: String,
    pub credits: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Enrollment {
    #[sqlx(rename = "enrollment_id")]
    pub id: i32,
    pub grade: Option<Grade>,
    #[sqlx(flatten)]
    pub course: Course,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EnrollmentDateGroup {
    pub enrollment_date: NaiveDate,
    pub student_count: i64,
}
