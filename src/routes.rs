pub mod about;
pub mod index;
pub mod students;
