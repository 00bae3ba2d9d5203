use std::collections::{HashMap, HashSet};

/// Default per-packet ceiling, in bytes
pub const DEFAULT_MAX_PACKET_SIZE: usize = 262_144;

/// Which hex-dump line shapes are recognized
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HexDialect {
    /// `0x` followed by exactly four hex digits and a blank, as printed by FortiGate
    Strict,
    /// Also accept `0x<hex>:` and bare `<hex><TAB>` offsets (FortiMail,
    /// FortiAuthenticator `tcpdump -XX`)
    Compatible,
}

/// Framing hint for the link-layer normalization
///
/// Sniffer verbosity decides whether Ethernet headers are printed. When it is
/// known, a hint avoids guessing from the packet bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkHint {
    /// Guess from the first bytes of each packet
    Auto,
    /// Packets already start with an Ethernet header
    Ethernet,
    /// Packets start with an IP header; always prepend a synthetic Ethernet header
    RawIp,
}

/// Conversion settings
///
/// All fields have sensible defaults; use the builder methods to change them:
///
/// ```rust
/// use sniffer_pcapng::{ConvertOptions, LinkHint};
///
/// let options = ConvertOptions::default()
///     .with_max_packet_size(9216)
///     .with_interface_hint("ssl.root", LinkHint::RawIp)
///     .exclude_interface("mgmt");
/// assert_eq!(options.max_packet_size, 9216);
/// ```
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    pub max_packet_size: usize,
    pub dialect: HexDialect,
    /// Split an ASCII gutter glued to the last hex group
    pub normalize_lines: bool,
    /// Require each hex-dump line offset to equal the bytes read so far
    pub strict_offsets: bool,
    /// Drop IPv4 packets whose total length exceeds the captured bytes
    pub check_packet_size: bool,
    pub link_hint: LinkHint,
    pub interface_hints: HashMap<String, LinkHint>,
    pub include_interfaces: HashSet<String>,
    pub exclude_interfaces: HashSet<String>,
    pub skip_packets: usize,
    pub limit_packets: Option<usize>,
    /// Attach direction and interface as an `opt_comment` to each packet
    pub packet_comments: bool,
    /// Append the header line number to the packet comment
    pub comment_line_numbers: bool,
    pub user_application: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            dialect: HexDialect::Compatible,
            normalize_lines: true,
            strict_offsets: false,
            check_packet_size: true,
            link_hint: LinkHint::Auto,
            interface_hints: HashMap::new(),
            include_interfaces: HashSet::new(),
            exclude_interfaces: HashSet::new(),
            skip_packets: 0,
            limit_packets: None,
            packet_comments: true,
            comment_line_numbers: false,
            user_application: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ConvertOptions {
    pub fn with_max_packet_size(mut self, max: usize) -> Self {
        self.max_packet_size = max;
        self
    }

    pub fn with_dialect(mut self, dialect: HexDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_normalize_lines(mut self, normalize: bool) -> Self {
        self.normalize_lines = normalize;
        self
    }

    pub fn with_strict_offsets(mut self, strict: bool) -> Self {
        self.strict_offsets = strict;
        self
    }

    pub fn with_packet_size_check(mut self, check: bool) -> Self {
        self.check_packet_size = check;
        self
    }

    pub fn with_link_hint(mut self, hint: LinkHint) -> Self {
        self.link_hint = hint;
        self
    }

    /// Override the framing hint for one interface
    pub fn with_interface_hint<S: Into<String>>(mut self, interface: S, hint: LinkHint) -> Self {
        self.interface_hints.insert(interface.into(), hint);
        self
    }

    /// Keep only packets of this interface (can be called several times)
    pub fn include_interface<S: Into<String>>(mut self, interface: S) -> Self {
        self.include_interfaces.insert(interface.into());
        self
    }

    /// Drop packets of this interface (can be called several times)
    pub fn exclude_interface<S: Into<String>>(mut self, interface: S) -> Self {
        self.exclude_interfaces.insert(interface.into());
        self
    }

    pub fn with_skip(mut self, count: usize) -> Self {
        self.skip_packets = count;
        self
    }

    pub fn with_limit(mut self, count: usize) -> Self {
        self.limit_packets = Some(count);
        self
    }

    pub fn with_packet_comments(mut self, comments: bool) -> Self {
        self.packet_comments = comments;
        self
    }

    pub fn with_comment_line_numbers(mut self, line_numbers: bool) -> Self {
        self.comment_line_numbers = line_numbers;
        self
    }

    pub fn with_user_application<S: Into<String>>(mut self, name: S) -> Self {
        self.user_application = name.into();
        self
    }

    /// Framing hint that applies to `interface`
    pub fn hint_for(&self, interface: &str) -> LinkHint {
        self.interface_hints
            .get(interface)
            .copied()
            .unwrap_or(self.link_hint)
    }

    /// True if packets of `interface` pass the include/exclude filters
    pub fn selects(&self, interface: &str) -> bool {
        if !self.include_interfaces.is_empty() && !self.include_interfaces.contains(interface) {
            return false;
        }
        !self.exclude_interfaces.contains(interface)
    }
}
