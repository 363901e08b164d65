pub mod constraints;
pub mod macros;
pub mod observing_block;
pub mod scheduling_constraint;
pub mod script;

pub use constraints::*;
pub use observing_block::*;
pub use scheduling_constraint::*;
pub use script::*;
