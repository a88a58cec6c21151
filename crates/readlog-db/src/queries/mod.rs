pub mod activities;
pub mod lists;
pub mod notes;
pub mod progress;
pub mod user_books;

pub use activities::ActivityQueries;
pub use lists::ListQueries;
pub use notes::NoteQueries;
pub use progress::ProgressQueries;
pub use user_books::UserBookQueries;
