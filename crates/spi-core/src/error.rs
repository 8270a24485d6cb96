use std::fmt;

/// Machine-readable error codes surfaced to the CLI and to JSON consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    FixtureParseError,
    EmptyAddressList,
    MultipleAddressTypes,
    BitWidthOverflow,
    NegativeBitValue,
    InvalidBlockExpiry,
    BlockHistoryOutOfOrder,
    UnrecognizedBlockEntry,
    InvalidIpV4,
    InvalidUserName,
    PermissionDenied,
    UpstreamFetchFailed,
    CacheStoreFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::FixtureParseError => "E1002",
            Self::EmptyAddressList => "E2001",
            Self::MultipleAddressTypes => "E2002",
            Self::BitWidthOverflow => "E2003",
            Self::NegativeBitValue => "E2004",
            Self::InvalidBlockExpiry => "E3001",
            Self::BlockHistoryOutOfOrder => "E3002",
            Self::UnrecognizedBlockEntry => "E3003",
            Self::InvalidIpV4 => "E4001",
            Self::InvalidUserName => "E4002",
            Self::PermissionDenied => "E5001",
            Self::UpstreamFetchFailed => "E5002",
            Self::CacheStoreFailed => "E6001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::FixtureParseError => "Fixture file parse error",
            Self::EmptyAddressList => "Empty address list",
            Self::MultipleAddressTypes => "Multiple address types",
            Self::BitWidthOverflow => "Value does not fit in bit width",
            Self::NegativeBitValue => "Negative value cannot be converted to bits",
            Self::InvalidBlockExpiry => "Invalid block expiry",
            Self::BlockHistoryOutOfOrder => "Block history out of order",
            Self::UnrecognizedBlockEntry => "Unrecognized block log entry",
            Self::InvalidIpV4 => "Invalid IPv4 address",
            Self::InvalidUserName => "Invalid user name",
            Self::PermissionDenied => "Permission denied by wiki",
            Self::UpstreamFetchFailed => "Wiki fetch failed",
            Self::CacheStoreFailed => "Cache store failure",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to investigators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the spi-tools config.toml and retry."),
            Self::FixtureParseError => Some("Check the fixture file is valid JSON in the documented shape."),
            Self::EmptyAddressList => Some("Pass at least one IP address."),
            Self::MultipleAddressTypes => Some("Analyse IPv4 and IPv6 addresses separately."),
            Self::BitWidthOverflow | Self::NegativeBitValue | Self::InternalUnexpected => None,
            Self::InvalidBlockExpiry => Some("Check the block log entry; expiry must not precede the block."),
            Self::BlockHistoryOutOfOrder => {
                Some("Supply block events oldest first with distinct timestamps.")
            }
            Self::UnrecognizedBlockEntry => {
                Some("Drop unknown block actions before building a history.")
            }
            Self::InvalidIpV4 => Some("Use dotted-quad IPv4 notation, e.g. 192.0.2.1."),
            Self::InvalidUserName => Some("User names must not contain '|'."),
            Self::PermissionDenied => Some("Log in with an account holding the required rights."),
            Self::UpstreamFetchFailed => Some("Retry once. If persistent, check wiki availability."),
            Self::CacheStoreFailed => Some("Run `spi cache clear` or retry with --no-cache."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
