use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How incoming events are routed to voices.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// One channel; voices are addressed by key.
    #[default]
    Midi,
    /// MIDI Polyphonic Expression: channel 1 is the main channel, every
    /// other channel carries one note and its expression.
    Mpe,
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("midi") {
            Ok(Protocol::Midi)
        } else if s.eq_ignore_ascii_case("mpe") {
            Ok(Protocol::Mpe)
        } else {
            Err(Error::UnknownProtocol(s.to_string()))
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Midi => f.write_str("MIDI"),
            Protocol::Mpe => f.write_str("MPE"),
        }
    }
}
