pub mod check;
pub mod users;
