mod factory;
mod fallible;

pub use factory::*;
pub use fallible::*;
