//! Network helpers.

mod listener;

pub use listener::NegotiatingListener;
