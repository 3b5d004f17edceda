// CV generation: entitlement gate → token charge → external AI call.
// All AI interactions go through the client module — nothing else talks to
// the generation API directly.

pub mod client;
pub mod handlers;
pub mod service;
