pub mod category;
pub mod leave_request;
pub mod statistics;
