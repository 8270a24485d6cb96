//! IP address analysis.

pub mod cidr;

pub use cidr::{CidrError, IpNetwork, int_to_bits, smallest_covering_network, uint_to_bits};
