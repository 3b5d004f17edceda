pub mod cv;
pub mod upgrade;
pub mod user;
