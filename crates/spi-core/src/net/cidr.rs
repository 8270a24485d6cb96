//! Smallest covering network inference.
//!
//! Given a set of same-family addresses, find the narrowest CIDR network that
//! contains all of them. Every address is expanded to a fixed-width bit
//! vector (32 bits for IPv4, 128 for IPv6, most significant bit first) and
//! each bit position is examined independently:
//!
//! - While every address agrees on a position, that bit joins the prefix.
//! - At the first position where both `0` and `1` are observed the prefix
//!   ends. That position and every later one is emitted as `0`, even if some
//!   later position happens to be uniform again. Prefix length only grows
//!   from the most significant end.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::Serialize;

use crate::error::ErrorCode;

const V4_WIDTH: u32 = 32;
const V6_WIDTH: u32 = 128;

// Observed-value masks per bit position.
const SAW_ZERO: u8 = 0b01;
const SAW_ONE: u8 = 0b10;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors returned by bit conversion and network inference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidrError {
    /// No addresses were supplied.
    #[error("empty address list")]
    EmptyAddressList,

    /// IPv4 and IPv6 addresses were mixed in one request.
    #[error("multiple address types")]
    MultipleAddressTypes,

    /// The value has a set bit at or above position `width`.
    #[error("value {value} does not fit in {width} bits")]
    ValueTooWide { value: u128, width: u32 },

    /// Negative values have no fixed-width unsigned bit representation.
    #[error("negative value {0} cannot be converted to bits")]
    NegativeValue(i128),
}

impl CidrError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyAddressList => ErrorCode::EmptyAddressList,
            Self::MultipleAddressTypes => ErrorCode::MultipleAddressTypes,
            Self::ValueTooWide { .. } => ErrorCode::BitWidthOverflow,
            Self::NegativeValue(_) => ErrorCode::NegativeBitValue,
        }
    }
}

// ---------------------------------------------------------------------------
// IpNetwork
// ---------------------------------------------------------------------------

/// A base address paired with a prefix length.
///
/// Bits below the prefix are always zero in the base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IpNetwork {
    base: IpAddr,
    prefix_len: u8,
}

impl IpNetwork {
    /// The network base address.
    #[must_use]
    pub const fn base(&self) -> IpAddr {
        self.base
    }

    /// Number of leading bits shared by every member of the network.
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns `true` if `addr` is the same family and shares the prefix.
    #[must_use]
    pub fn contains(&self, addr: &IpAddr) -> bool {
        if addr.is_ipv4() != self.base.is_ipv4() {
            return false;
        }
        let shift = address_width(&self.base) - u32::from(self.prefix_len);
        if shift >= V6_WIDTH {
            return true;
        }
        (address_bits(addr) ^ address_bits(&self.base)) >> shift == 0
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix_len)
    }
}

// ---------------------------------------------------------------------------
// Bit conversion
// ---------------------------------------------------------------------------

/// Convert a non-negative integer into `width` binary digits, MSB first.
///
/// # Errors
///
/// [`CidrError::NegativeValue`] if `value < 0`, and
/// [`CidrError::ValueTooWide`] if `value` does not fit in `width` bits.
///
/// # Examples
///
/// ```
/// use spi_core::net::int_to_bits;
///
/// assert_eq!(int_to_bits(42, 8).unwrap(), vec![0, 0, 1, 0, 1, 0, 1, 0]);
/// assert!(int_to_bits(9999, 4).is_err());
/// ```
pub fn int_to_bits(value: i128, width: u32) -> Result<Vec<u8>, CidrError> {
    let unsigned = u128::try_from(value).map_err(|_| CidrError::NegativeValue(value))?;
    uint_to_bits(unsigned, width)
}

/// Unsigned variant of [`int_to_bits`], able to hold a full IPv6 address.
///
/// Widths above 128 are padded with leading zeros.
///
/// # Errors
///
/// [`CidrError::ValueTooWide`] if `value` does not fit in `width` bits.
pub fn uint_to_bits(value: u128, width: u32) -> Result<Vec<u8>, CidrError> {
    if width < V6_WIDTH && value >> width != 0 {
        return Err(CidrError::ValueTooWide { value, width });
    }
    Ok((0..width)
        .rev()
        .map(|pos| {
            if pos >= V6_WIDTH {
                0
            } else {
                u8::from((value >> pos) & 1 == 1)
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

/// Find the smallest network containing every address in `addresses`.
///
/// A single address yields itself with a full-width prefix (`/32` or `/128`).
///
/// # Errors
///
/// [`CidrError::EmptyAddressList`] for an empty slice and
/// [`CidrError::MultipleAddressTypes`] when IPv4 and IPv6 are mixed.
pub fn smallest_covering_network(addresses: &[IpAddr]) -> Result<IpNetwork, CidrError> {
    let first = addresses.first().ok_or(CidrError::EmptyAddressList)?;
    let is_v4 = first.is_ipv4();
    if addresses.iter().any(|addr| addr.is_ipv4() != is_v4) {
        return Err(CidrError::MultipleAddressTypes);
    }

    let width = address_width(first);
    let mut observed = vec![0_u8; width as usize];
    for addr in addresses {
        let bits = uint_to_bits(address_bits(addr), width)?;
        for (seen, bit) in observed.iter_mut().zip(bits) {
            *seen |= if bit == 1 { SAW_ONE } else { SAW_ZERO };
        }
    }

    let mut in_prefix = true;
    let mut prefix_len: u8 = 0;
    let mut value: u128 = 0;
    for seen in observed {
        value <<= 1;
        if in_prefix && seen != SAW_ZERO | SAW_ONE {
            value |= u128::from(seen == SAW_ONE);
            prefix_len += 1;
        } else {
            in_prefix = false;
        }
    }

    let network = IpNetwork {
        base: address_from_bits(value, is_v4),
        prefix_len,
    };
    tracing::debug!(count = addresses.len(), %network, "inferred covering network");
    Ok(network)
}

const fn address_width(addr: &IpAddr) -> u32 {
    match addr {
        IpAddr::V4(_) => V4_WIDTH,
        IpAddr::V6(_) => V6_WIDTH,
    }
}

fn address_bits(addr: &IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(*v4)),
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

fn address_from_bits(value: u128, is_v4: bool) -> IpAddr {
    if is_v4 {
        // Only the low 32 bits are ever populated for IPv4 input.
        let low = u32::try_from(value & u128::from(u32::MAX)).unwrap_or(0);
        IpAddr::V4(Ipv4Addr::from(low))
    } else {
        IpAddr::V6(Ipv6Addr::from(value))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
