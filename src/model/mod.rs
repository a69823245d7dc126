pub mod leave_application;
pub mod leave_credit;
pub mod role;
pub mod user;
