use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
///
/// Variants serialize as their wire string (snake_case), so serde JSON and
/// `as_str` agree.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Booked => "booked",
    Pending => "pending",
    Cancelled => "cancelled",
    Completed => "completed",
});

str_enum!(PrescriptionStatus {
    Draft => "draft",
    Ready => "ready",
    Sent => "sent",
    Error => "error",
});

str_enum!(RefillStatus {
    Pending => "pending",
    Approved => "approved",
    Denied => "denied",
    Completed => "completed",
});
