// Upgrade-request workflow: manual payment verification.
// submit → pending → approved | rejected, terminal states final.

pub mod handlers;
pub mod service;
pub mod validation;
