//! Session tests driven against an in-process fake server.

mod support;
