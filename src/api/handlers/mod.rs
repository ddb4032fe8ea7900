pub mod analytics;
pub mod directory;
pub mod health;
pub mod prescriptions;
