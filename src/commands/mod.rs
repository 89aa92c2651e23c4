pub mod guidance;
pub mod health;
pub mod import;
pub mod index;
