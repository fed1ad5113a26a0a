use std::{fmt, str::FromStr};

/// Maximum number of rwbs bytes the block layer emits, terminator included.
pub const RWBS_LEN: usize = 8;

/// Which set of operation kinds is tallied and reported.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Read, write, discard and flush. The first recognized kind wins.
    #[default]
    Classic,
    /// Read or write, plus an orthogonal synchronous bit.
    Sync,
}

impl Variant {
    /// The column headings of the per-kind percentages, in output order.
    pub fn headings(self) -> &'static [&'static str] {
        match self {
            Variant::Classic => &["%READ", "%WRITE", "%DISCARD", "%FLUSH"],
            Variant::Sync => &["%READ", "%WRITE", "%OTHER", "%SYNC", "%ASYNC"],
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Classic => f.write_str("classic"),
            Variant::Sync => f.write_str("sync"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Variant::Classic),
            "sync" => Ok(Variant::Sync),
            other => Err(format!("unknown variant \"{other}\", expected classic or sync")),
        }
    }
}

bitflags::bitflags! {
    /// The operation kinds decoded from an rwbs flag string.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpSet: u8 {
        /// `R`
        const READ = 1 << 0;
        /// `W`
        const WRITE = 1 << 1;
        /// `D`
        const DISCARD = 1 << 2;
        /// `F`
        const FLUSH = 1 << 3;
        /// `S`
        const SYNC = 1 << 4;
    }
}

/// Decode an rwbs flag string into the operation kinds it carries.
///
/// At most [`RWBS_LEN`] bytes are scanned and a NUL byte ends the string
/// early. Unrecognized flags are ignored.
///
/// With [`Variant::Classic`] the first of `R`, `W`, `D` or `F` decides the
/// kind, and a string with none of them decodes to the empty set, which is
/// never tallied. With [`Variant::Sync`] the result holds at most one of
/// `READ`/`WRITE` (`READ` when both are present) and `SYNC` whenever an `S`
/// appears.
pub fn decode_rwbs(rwbs: impl AsRef<[u8]>, variant: Variant) -> OpSet {
    let flags = rwbs
        .as_ref()
        .iter()
        .copied()
        .take(RWBS_LEN)
        .take_while(|&b| b != 0);

    match variant {
        Variant::Classic => flags
            .filter_map(|b| match b {
                b'R' => Some(OpSet::READ),
                b'W' => Some(OpSet::WRITE),
                b'D' => Some(OpSet::DISCARD),
                b'F' => Some(OpSet::FLUSH),
                _ => None,
            })
            .next()
            .unwrap_or_default(),
        Variant::Sync => {
            let mut ops = OpSet::empty();
            for b in flags {
                match b {
                    b'R' => ops.insert(OpSet::READ),
                    b'W' => ops.insert(OpSet::WRITE),
                    b'S' => ops.insert(OpSet::SYNC),
                    _ => {}
                }
            }
            if ops.contains(OpSet::READ) {
                ops.remove(OpSet::WRITE);
            }
            ops
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_first_match_wins() {
        assert_eq!(decode_rwbs("R", Variant::Classic), OpSet::READ);
        assert_eq!(decode_rwbs("WS", Variant::Classic), OpSet::WRITE);
        assert_eq!(decode_rwbs("FWS", Variant::Classic), OpSet::FLUSH);
        assert_eq!(decode_rwbs("DS", Variant::Classic), OpSet::DISCARD);
        assert_eq!(decode_rwbs("RA", Variant::Classic), OpSet::READ);
    }

    #[test]
    fn classic_without_a_kind_is_uncounted() {
        assert_eq!(decode_rwbs("N", Variant::Classic), OpSet::empty());
        assert_eq!(decode_rwbs("", Variant::Classic), OpSet::empty());
        assert_eq!(decode_rwbs("SM", Variant::Classic), OpSet::empty());
    }

    #[test]
    fn terminator_stops_the_scan() {
        assert_eq!(decode_rwbs(b"\0R", Variant::Classic), OpSet::empty());
        assert_eq!(decode_rwbs(b"S\0W", Variant::Sync), OpSet::SYNC);
    }

    #[test]
    fn scan_is_bounded() {
        let long = b"AAAAAAAAW";
        assert_eq!(long.len(), RWBS_LEN + 1);
        assert_eq!(decode_rwbs(long, Variant::Classic), OpSet::empty());
    }

    #[test]
    fn sync_variant_prefers_read() {
        assert_eq!(decode_rwbs("WS", Variant::Sync), OpSet::WRITE | OpSet::SYNC);
        assert_eq!(decode_rwbs("RS", Variant::Sync), OpSet::READ | OpSet::SYNC);
        assert_eq!(decode_rwbs("WR", Variant::Sync), OpSet::READ);
        assert_eq!(decode_rwbs("FWFS", Variant::Sync), OpSet::WRITE | OpSet::SYNC);
        assert_eq!(decode_rwbs("D", Variant::Sync), OpSet::empty());
    }

    #[test]
    fn variant_parses_from_cli_names() {
        assert_eq!("sync".parse::<Variant>(), Ok(Variant::Sync));
        assert_eq!(Variant::Classic.to_string(), "classic");
        assert!("bogus".parse::<Variant>().is_err());
    }
}
