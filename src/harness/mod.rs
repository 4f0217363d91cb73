pub mod actions;
pub mod context;
pub mod selectors;
pub mod session;
pub mod types;
pub mod wait;

pub use session::Session;
pub use types::{
    Credentials, DeepAnalysis, HarnessError, HarnessResult, LoginOutcome, QueryResponse, Target,
};
pub use wait::{Waiter, await_condition, settle};
