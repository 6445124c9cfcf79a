//! Board commands

mod add;
mod delete;
mod get;
mod list;
mod mv;
mod update;

pub use add::AddBoard;
pub use delete::DeleteBoard;
pub use get::GetBoard;
pub use list::ListBoards;
pub use mv::MoveBoard;
pub use update::UpdateBoard;
