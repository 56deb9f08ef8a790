pub mod jira;
pub mod timesheet;
