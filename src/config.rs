//! Recognized configuration (§6): CLI flags with env-var fallback, the way
//! `MartinKlapacz-Chord-Network` drives its node off a `clap::Parser`.
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BootstrapMode {
    Init,
    Join,
}

#[derive(Debug, Parser)]
#[command(name = "chord-node", about = "A Chord DHT ring peer")]
pub struct Config {
    /// Interface to bind.
    #[arg(long, env = "CHORD_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Fixed listening port; also the port peer addresses are reached on.
    #[arg(long, env = "CHORD_PORT", default_value_t = 50051)]
    pub port: u16,

    /// Identifier-space exponent `m`; the ring is `Z_{2^ft_size}`.
    #[arg(long = "ft-size", env = "CHORD_FT_SIZE", default_value_t = 7)]
    pub ft_size: u32,

    /// Whether this node bootstraps an empty ring or joins an existing one.
    #[arg(long = "bootstrap-mode", env = "CHORD_BOOTSTRAP_MODE", value_enum)]
    pub bootstrap_mode: BootstrapMode,

    /// Address of a live peer to join through; required when bootstrap_mode == join.
    #[arg(long = "bootstrap-addr", env = "CHORD_BOOTSTRAP_ADDR")]
    pub bootstrap_addr: Option<String>,

    /// Whether to pull owned records from the successor right after joining.
    #[arg(long = "transfer-data", env = "CHORD_TRANSFER_DATA", default_value_t = true)]
    pub transfer_data: bool,

    /// Where the local record store persists.
    #[arg(long = "data-dir", env = "CHORD_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,
}

impl Config {
    pub fn own_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.bootstrap_mode, BootstrapMode::Join) && self.bootstrap_addr.is_none() {
            return Err("bootstrap_addr is required when bootstrap_mode == join".to_string());
        }
        // finger_table.rs and ring.rs shift a signed `1i64 << i` for i up to
        // ft_size - 1; capping below 63 keeps that shift clear of the sign bit.
        if self.ft_size == 0 || self.ft_size > 62 {
            return Err("ft_size must be in 1..=62".to_string());
        }
        Ok(())
    }
}
