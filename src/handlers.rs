pub mod statistics;
pub mod students;

/// Where a submitted form sends the browser next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    StudentList,
    DeleteConfirmation { id: i32, save_changes_error: bool },
}

impl Destination {
    pub fn uri(self) -> String {
        match self {
            Self::StudentList => "/students".to_string(),
            Self::DeleteConfirmation {
                id,
                save_changes_error,
            } => format!("/students/delete?id={id}&save_changes_error={save_changes_error}"),
        }
    }
}

#[derive(Debug)]
pub enum Next<P> {
    Render(P),
    Redirect(Destination),
}
