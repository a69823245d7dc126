pub mod leave_application;
pub mod leave_credit;
