mod constant;
#[allow(clippy::module_inception)]
mod providers;
mod request_scoped;
mod seeded;
mod singleton;
mod transient;

pub use constant::*;
pub use providers::*;
pub use request_scoped::*;
pub use seeded::*;
pub use singleton::*;
pub use transient::*;
