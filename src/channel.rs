use std::fmt;

use serde::{Deserialize, Serialize};

/// AVHRR/3 channels. Channels 3A and 3B share one MDR radiance slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Ch1,
    Ch2,
    Ch3a,
    Ch3b,
    Ch4,
    Ch5,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Ch1,
        Channel::Ch2,
        Channel::Ch3a,
        Channel::Ch3b,
        Channel::Ch4,
        Channel::Ch5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::Ch1 => "1",
            Channel::Ch2 => "2",
            Channel::Ch3a => "3a",
            Channel::Ch3b => "3b",
            Channel::Ch4 => "4",
            Channel::Ch5 => "5",
        }
    }

    /// Position of this channel's radiances among the five MDR slots.
    pub fn mdr_slot(self) -> usize {
        match self {
            Channel::Ch1 => 0,
            Channel::Ch2 => 1,
            Channel::Ch3a | Channel::Ch3b => 2,
            Channel::Ch4 => 3,
            Channel::Ch5 => 4,
        }
    }

    /// Index into the solar calibration arrays (channels 1, 2, 3A).
    pub fn solar_index(self) -> Option<usize> {
        match self {
            Channel::Ch1 => Some(0),
            Channel::Ch2 => Some(1),
            Channel::Ch3a => Some(2),
            _ => None,
        }
    }

    /// Index into the thermal calibration arrays (channels 3B, 4, 5).
    pub fn thermal_index(self) -> Option<usize> {
        match self {
            Channel::Ch3b => Some(0),
            Channel::Ch4 => Some(1),
            Channel::Ch5 => Some(2),
            _ => None,
        }
    }

    pub fn is_reflective(self) -> bool {
        self.solar_index().is_some()
    }

    /// Scale applied to raw scene radiance counts.
    pub fn radiance_scale(self) -> f32 {
        if self.mdr_slot() == 2 { 1e-4 } else { 1e-2 }
    }

    pub fn radiance_unit(self) -> &'static str {
        if self.is_reflective() {
            "W/(m^2*sr*µm)"
        } else {
            "mW/(m^2*sr*cm^-1)"
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which of channel 3A or 3B a product carries, from the frame indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel3State {
    Ch3a,
    Ch3b,
    /// First and last scan line disagree.
    Ambiguous,
}

impl Channel3State {
    /// Classify from the channel-3 bits of the first and last scan line.
    pub fn from_bits(first: u8, last: u8) -> Self {
        match (first & 1, last & 1) {
            (1, 1) => Channel3State::Ch3a,
            (0, 0) => Channel3State::Ch3b,
            _ => Channel3State::Ambiguous,
        }
    }

    /// Whether `channel` can be read from a product in this state.
    pub fn serves(self, channel: Channel) -> bool {
        match (self, channel) {
            (Channel3State::Ch3a, Channel::Ch3b) => false,
            (Channel3State::Ch3b, Channel::Ch3a) => false,
            _ => true,
        }
    }
}

impl fmt::Display for Channel3State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Channel3State::Ch3a => "3A",
            Channel3State::Ch3b => "3B",
            Channel3State::Ambiguous => "AMBIGUOUS",
        };
        write!(f, "{}", s)
    }
}
