//! Lead capture onboarding conversation.
//!
//! [`state`] defines the stage machine, [`session`] the per-user state and
//! its store, [`validate`] the email and phone checks, [`prompts`] the copy
//! and keyboards, and [`engine`] ties them together into an I/O-free
//! conversation driver.

pub mod engine;
pub mod prompts;
pub mod session;
pub mod state;
pub mod validate;

pub use engine::{Callback, Event, OnboardingEngine, Outbound, UserIdentity};
pub use session::{InMemorySessionStore, LeadFields, Session, SessionStore};
pub use state::Stage;
