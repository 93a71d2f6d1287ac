//! Domain models for the hospital records system.

/// Declare a closed enum whose variants are persisted as short text codes.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $code)] $variant),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored text code.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            /// Parse a stored text code.
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

mod action;
mod catalog;
mod diagnosis;
mod doctor;
mod history;
mod patient;
mod person;
mod schedule;
mod validation;
mod visit;

pub use action::*;
pub use catalog::*;
pub use diagnosis::*;
pub use doctor::*;
pub use history::*;
pub use patient::*;
pub use person::*;
pub use schedule::*;
pub use validation::*;
pub use visit::*;

/// Generate a new record identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
