//! Domain types.

mod properties;
mod server;

pub use properties::{PROPERTIES_FILE, PropertiesError, ServerProperties};
pub use server::{DEFAULT_JAR_NAME, ServerDefinition, unique_name};
