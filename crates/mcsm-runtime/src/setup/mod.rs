//! Server directory setup and the Mojang artifact source.

mod piston;
mod workflow;

pub use piston::{PISTON_META_MANIFEST, PistonArtifactSource};
pub use workflow::{SetupReport, SetupRequest, run_setup, sha1_file};
