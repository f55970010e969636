//! ipmon - raw IP capture and protocol header decoding.
//!
//! ipmon opens a raw capture socket per local IPv4 address, delivers every
//! packet it sees as an event, and decodes IPv4/IPv6/TCP/UDP/ICMP headers
//! from those packets without copying them.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`wire`]: Bit primitives, header codecs and the version dispatcher
//! - [`capture`]: Capture sessions, their receive cycle and interface discovery
//! - [`config`]: Configuration loading and validation
//! - [`metrics`]: Prometheus exporter setup
//! - [`error`]: Error types
//!
//! # Testing
//!
//! Sockets and interface enumeration sit behind traits so capture sessions
//! can be driven without privileges or network access. Codecs are pure
//! functions over byte slices:
//!
//! ```rust
//! use ipmon::wire::{self, IpVersion, Protocol};
//!
//! let packet = [
//!     0x45, 0, 0, 20, 0, 0, 0x40, 0, 64, 17, 0, 0, 10, 0, 0, 1, 10, 0, 0, 2,
//! ];
//! assert_eq!(wire::identify_version(&packet), IpVersion::V4);
//!
//! let header = wire::parse(&packet).unwrap().unwrap();
//! assert_eq!(header.protocol(), Protocol::Udp);
//! assert!(header.payload().is_empty());
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod metrics;
pub mod wire;

pub use config::Config;
pub use error::{Error, Result};
