pub mod dispatch;
pub mod report;
