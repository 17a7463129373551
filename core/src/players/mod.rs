//! Player bookkeeping
//!
//! - **PlayerRegistry**: one cached entity handle per user id
//! - **shift_property**: temporary additive change to a numeric property

mod registry;
mod shift;


pub use registry::PlayerRegistry;
pub use shift::shift_property;
