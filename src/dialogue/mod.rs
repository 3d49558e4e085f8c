//! Dialogue flow — per-user session state, the collection finite-state
//! machine, and the choice-token vocabulary that drives it.

pub mod machine;
pub mod session;
pub mod state;
pub mod token;
pub mod validate;

pub use machine::{DialogueMachine, MachineOutcome};
pub use session::{Session, SessionStore};
pub use state::DialogueState;
pub use token::ChoiceToken;
pub use validate::{ValidationFailure, parse_age, parse_height, parse_weight};
