use std::{num::ParseIntError, str::FromStr};

use crate::{device::DeviceId, ops::RWBS_LEN};

const TRACEPOINT: &str = "block_rq_complete:";

/// A completed block I/O request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    /// The device the request was issued to.
    pub dev: DeviceId,
    /// First sector of the request.
    pub sector: u64,
    /// Length of the request in 512-byte sectors.
    pub nr_sector: u32,
    rwbs: [u8; RWBS_LEN],
}

impl CompletionEvent {
    /// Build an event. `rwbs` is truncated to [`RWBS_LEN`] bytes.
    pub fn new(dev: DeviceId, sector: u64, nr_sector: u32, rwbs: impl AsRef<[u8]>) -> Self {
        let mut buf = [0; RWBS_LEN];
        let rwbs = rwbs.as_ref();
        let len = rwbs.len().min(RWBS_LEN);
        buf[..len].copy_from_slice(&rwbs[..len]);

        CompletionEvent {
            dev,
            sector,
            nr_sector,
            rwbs: buf,
        }
    }

    /// The raw operation flags, NUL padded.
    pub fn rwbs(&self) -> &[u8] {
        &self.rwbs
    }
}

/// Errors from parsing a `block_rq_complete` trace line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseEventError {
    /// The line comes from some other tracepoint.
    #[error("not a block_rq_complete event")]
    OtherEvent,
    /// A field is missing or malformed.
    #[error("missing or malformed {0}")]
    Malformed(&'static str),
    /// A numeric field failed to parse.
    #[error("invalid {field}")]
    InvalidNumber {
        /// The offending field.
        field: &'static str,
        /// Why it failed.
        #[source]
        error: ParseIntError,
    },
}

fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(s.split_once(char::is_whitespace).unwrap_or((s, "")))
}

fn number<T: FromStr<Err = ParseIntError>>(
    field: &'static str,
    value: Option<&str>,
) -> Result<T, ParseEventError> {
    value
        .ok_or(ParseEventError::Malformed(field))?
        .parse()
        .map_err(|error| ParseEventError::InvalidNumber { field, error })
}

impl FromStr for CompletionEvent {
    type Err = ParseEventError;

    /// Parse the text the kernel writes to `trace_pipe` for the
    /// `block:block_rq_complete` tracepoint, for example
    ///
    /// ```text
    /// kworker/1:1H-120 [001] d..1. 91.338461: block_rq_complete: 8,0 WS () 2048 + 8 [0]
    /// ```
    ///
    /// The command in parentheses and the trailing ioprio and error fields
    /// are ignored.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (_, rest) = line
            .split_once(TRACEPOINT)
            .ok_or(ParseEventError::OtherEvent)?;
        let (dev, rest) = next_field(rest).ok_or(ParseEventError::Malformed("device"))?;
        let (major, minor) = dev
            .split_once(',')
            .ok_or(ParseEventError::Malformed("device"))?;
        let dev = DeviceId::new(
            number("major", Some(major))?,
            number("minor", Some(minor))?,
        );
        let (rwbs, rest) = next_field(rest).ok_or(ParseEventError::Malformed("rwbs"))?;

        // the command may contain spaces, so skip to its closing parenthesis
        let rest = rest.trim_start();
        let range = match rest.strip_prefix('(') {
            Some(command) => {
                let (_, range) = command
                    .split_once(')')
                    .ok_or(ParseEventError::Malformed("command"))?;
                range
            }
            None => rest,
        };

        let mut range = range.split_whitespace();
        let sector = number("sector", range.next())?;
        if range.next() != Some("+") {
            return Err(ParseEventError::Malformed("sector range"));
        }
        let nr_sector = number("nr_sector", range.next())?;

        Ok(CompletionEvent::new(dev, sector, nr_sector, rwbs))
    }
}
