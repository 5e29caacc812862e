//! Configuration
//!
//! The collective roster, backend selection, and storage locations, loaded
//! from `~/.config/labmail/config.yaml`.

mod labmail_config;

pub use labmail_config::{Backend, LabMailConfig};
