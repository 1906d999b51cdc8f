mod bridge;
mod cache;
mod cleanup;
mod context;
mod error;
mod id;
mod lifecycle;
mod options;
mod resource;

pub use bridge::*;
pub use cache::*;
pub use cleanup::*;
pub use context::*;
pub use error::*;
pub use id::*;
pub use lifecycle::*;
pub use options::*;
pub use resource::*;
