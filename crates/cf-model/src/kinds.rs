//! Closed keyword sets used by entity fields.
//!
//! Each keyword renders as its upper-case deck token and parses
//! case-insensitively.

use core::fmt;

use serde::{Deserialize, Serialize};

macro_rules! deck_keyword {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $token)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn key(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl std::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_uppercase().as_str() {
                    $($token => Ok($name::$variant),)+
                    _ => Err(concat!("expected one of: ", $($token, " "),+)),
                }
            }
        }
    };
}

deck_keyword! {
    /// What opens or closes a vent, or ignites a fire.
    Criterion {
        Time => "TIME",
        Temperature => "TEMPERATURE",
        Flux => "FLUX",
    }
}

deck_keyword! {
    /// Wall of the first compartment a wall vent sits in.
    WallFace {
        Front => "FRONT",
        Rear => "REAR",
        Left => "LEFT",
        Right => "RIGHT",
    }
}

deck_keyword! {
    /// Which horizontal surface a ceiling/floor vent pierces.
    CeilingFloorKind {
        Floor => "FLOOR",
        Ceiling => "CEILING",
    }
}

deck_keyword! {
    VentShape {
        Round => "ROUND",
        Square => "SQUARE",
    }
}

deck_keyword! {
    /// Orientation of one end of a mechanical duct.
    Orientation {
        Vertical => "VERTICAL",
        Horizontal => "HORIZONTAL",
    }
}

deck_keyword! {
    TargetShape {
        Plate => "PLATE",
        Cylinder => "CYLINDER",
    }
}

deck_keyword! {
    /// Units of a target's temperature depth.
    DepthUnits {
        Meters => "M",
        Fraction => "FRACTION",
    }
}

deck_keyword! {
    ConnectionType {
        Wall => "WALL",
        Floor => "FLOOR",
    }
}
