//! Derived view fields computed from repository records.
//!
//! Screens call these instead of recomputing balances, ratios and line
//! listings themselves. All functions are pure and total.

mod memberships;
mod sales;
mod vouchers;

pub use memberships::*;
pub use sales::*;
pub use vouchers::*;
