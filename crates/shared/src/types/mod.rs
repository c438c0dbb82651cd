//! Common types used across the workspace.

pub mod commodity;
pub mod id;
pub mod mode;
pub mod period;

pub use commodity::{Commodity, CURRENCY_NAMESPACE, FUND_NAMESPACE};
pub use id::*;
pub use mode::{RunMode, SessionDomain};
pub use period::PeriodSpan;
