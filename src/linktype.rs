use rusticata_macros::newtype_enum;

/// Data link type
///
/// The link-layer header type specifies the type of headers at the beginning
/// of the packet.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,

    RAW = 101,

    LOOP = 108,

    // Raw IPv4; the packet begins with an IPv4 header.
    IPV4 = 228,
    // Raw IPv6; the packet begins with an IPv6 header.
    IPV6 = 229,
}
}

impl Linktype {
    /// Link types the writer knows how to declare
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Linktype::NULL
                | Linktype::ETHERNET
                | Linktype::RAW
                | Linktype::LOOP
                | Linktype::IPV4
                | Linktype::IPV6
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Linktype;

    #[test]
    fn linktype_display() {
        assert_eq!(Linktype::ETHERNET.to_string(), "ETHERNET");
        assert_eq!(Linktype::RAW.to_string(), "RAW");
    }

    #[test]
    fn linktype_supported() {
        assert!(Linktype::ETHERNET.is_supported());
        assert!(!Linktype(147).is_supported());
    }
}
