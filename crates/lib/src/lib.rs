//! tgrelay core library: Telegram channel handler, gateway, and config,
//! used by the `tgrelay` CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod transport;
