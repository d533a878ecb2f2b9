pub mod action;
pub mod delete;
pub mod list;
pub mod logs;
pub mod scan;
pub mod search;
