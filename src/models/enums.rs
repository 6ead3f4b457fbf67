use serde::{Deserialize, Serialize};

/// Unknown string for a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: &'static str,
    pub value: String,
}

/// Macro to generate enum with as_str + ALL + std::str::FromStr pattern.
///
/// Variant declaration order is the canonical order: `Ord` follows it, so
/// ordered maps keyed by these enums serialise in that order.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(FlowLevel {
    None => "none",
    Light => "light",
    Medium => "medium",
    Heavy => "heavy",
});

str_enum!(Mood {
    Great => "great",
    Good => "good",
    Neutral => "neutral",
    Bad => "bad",
    Terrible => "terrible",
});

str_enum!(EnergyLevel {
    High => "high",
    Medium => "medium",
    Low => "low",
});

str_enum!(RiskLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl FlowLevel {
    pub fn is_flow(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Mood {
    pub fn is_poor(&self) -> bool {
        matches!(self, Self::Bad | Self::Terrible)
    }
}
