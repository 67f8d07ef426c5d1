//! Membership & leadership engine.
//!
//! Players join, leave and get removed from teams and clans through the
//! closed set of [`Intent`]s. The engine works on an in-memory [`League`]
//! graph and reports every edge it touched as a [`Change`]; storing those
//! changes is left to `crate::db::membership_repo`.

pub mod authority;
pub mod engine;
pub mod error;
pub mod graph;
pub mod types;
pub mod view;

pub use authority::authorize;
pub use engine::apply;
pub use error::{MembershipError, MembershipResult, TeamRef};
pub use graph::{ClanNode, League, PlayerNode, TeamNode};
pub use types::{Change, ClanLeavePolicy, Intent, MembershipStatus, Outcome, Policy, Target};
