//! Database enum types with Diesel serialization.
//!
//! This module provides type-safe enum wrappers for database CHECK constraints.
//! Each enum implements `ToSql` and `FromSql` for automatic conversion between Rust and `PostgreSQL`,
//! and converts losslessly to and from its `cadence_core::types` counterpart.

use cadence_core::types;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident => $core:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Returns the database string representation of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                match std::str::from_utf8(bytes.as_bytes())? {
                    $($text => Ok(Self::$variant),)+
                    _ => Err("Unrecognized enum variant".into()),
                }
            }
        }

        impl From<$name> for types::$core {
            fn from(db_value: $name) -> Self {
                match db_value {
                    $($name::$variant => Self::$variant),+
                }
            }
        }

        impl From<types::$core> for $name {
            fn from(core_value: types::$core) -> Self {
                match core_value {
                    $(types::$core::$variant => Self::$variant),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Recurrence frequency.
    ///
    /// Maps to `recurrence_rule.frequency` CHECK constraint.
    Frequency => Frequency {
        Daily => "daily",
        Weekly => "weekly",
        Biweekly => "biweekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
}

text_enum! {
    /// Occurrence lifecycle status.
    ///
    /// Maps to `event_occurrence.status` CHECK constraint.
    OccurrenceStatus => OccurrenceStatus {
        Upcoming => "upcoming",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    /// Free/busy transparency.
    ///
    /// Maps to `calendar_event.transparency` and `event_exception.transparency` CHECK constraints.
    Transparency => Transparency {
        Opaque => "opaque",
        Transparent => "transparent",
    }
}

text_enum! {
    /// Reminder delivery channel.
    ///
    /// Maps to `event_reminder.method` CHECK constraint.
    ReminderMethod => ReminderMethod {
        Notification => "notification",
        Email => "email",
    }
}
