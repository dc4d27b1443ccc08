//! Host tests driven against stub servers.

mod behaviour;
mod support;
