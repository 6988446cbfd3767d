pub mod confirm;
pub mod dashboard;
pub mod sidebar;
