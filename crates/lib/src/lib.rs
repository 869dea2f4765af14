//! voxrelay core library — configuration, the text-to-speech relay, and the two front
//! ends (HTTP webhook and stdin/stdout agent) used by the CLI.

pub mod agent;
pub mod config;
pub mod init;
pub mod relay;
pub mod reply;
pub mod session;
pub mod tts;
pub mod webhook;
