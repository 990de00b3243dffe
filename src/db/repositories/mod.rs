pub mod audits;
pub mod history;
