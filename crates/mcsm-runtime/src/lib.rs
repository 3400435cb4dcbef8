//! Runtime side of mcsm: process supervision, event broadcasting, port
//! negotiation, server setup and host probes.
#![deny(unused_crate_dependencies)]

pub mod broadcast;
pub mod net;
pub mod process;
pub mod setup;
pub mod system;

pub use broadcast::{
    Broadcaster, BroadcasterConfig, EventQueue, EventReceiver, Frame, ObserverKind,
    ObserverRegistry, ObserverSubscription,
};
pub use net::NegotiatingListener;
pub use process::{
    ConsoleBuffer, PlatformTerminator, ProcessStatus, ServerSummary, StopOutcome, Supervisor,
    SupervisorConfig, Terminator,
};
pub use setup::{PistonArtifactSource, SetupReport, SetupRequest, run_setup};
pub use system::{JavaCheck, check_java};
