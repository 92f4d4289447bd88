//! Material node graphs: data model, synthesis and layout.

mod builder;
pub mod layout;
pub mod sockets;
mod types;

pub use builder::ShaderGraphBuilder;
pub use types::*;
