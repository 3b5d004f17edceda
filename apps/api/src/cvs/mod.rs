// CV record store: validation → entitlement gate → codec → persistence.
// Handlers stay thin; the service functions own the semantics.

pub mod handlers;
pub mod service;
pub mod validation;
