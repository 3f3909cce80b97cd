use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PatioId);
id_newtype!(ZoneId);
id_newtype!(BoxId);
id_newtype!(ContactId);
id_newtype!(AddressId);
id_newtype!(ClientId);
id_newtype!(VehicleId);
id_newtype!(ParkingId);
id_newtype!(NotificationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PatioStatus {
    #[default]
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "I")]
    Inactive,
}

impl PatioStatus {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Active => "A",
            Self::Inactive => "I",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::Active),
            "I" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for PatioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Zones share the patio's active/inactive codes.
pub type ZoneStatus = PatioStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BoxStatus {
    #[default]
    #[serde(rename = "L")]
    Free,
    #[serde(rename = "O")]
    Occupied,
    #[serde(rename = "M")]
    Maintenance,
}

impl BoxStatus {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Free => "L",
            Self::Occupied => "O",
            Self::Maintenance => "M",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "L" => Some(Self::Free),
            "O" => Some(Self::Occupied),
            "M" => Some(Self::Maintenance),
            _ => None,
        }
    }

    /// Occupied and maintenance boxes both refuse a new vehicle.
    pub fn is_busy(self) -> bool {
        !matches!(self, Self::Free)
    }
}

impl fmt::Display for BoxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Key used to match boxes and zones between client and server lists.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
