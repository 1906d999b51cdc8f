mod info;
mod request;

pub use info::*;
pub use request::*;
