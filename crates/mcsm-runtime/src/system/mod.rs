//! Host system probes.

mod java;

pub use java::{JavaCheck, MIN_JAVA_MAJOR, check_java, parse_major_version};
