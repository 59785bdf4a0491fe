//! User record value produced by `createUser`.

use std::fmt;

use serde::Serialize;

/// Immutable `{id, name, email}` record.
///
/// Validation is a separate contract operation; a record is built from
/// whatever it is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl UserRecord {
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        UserRecord {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Values are interpolated verbatim; embedded quotes are not escaped.
impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User{{id: {}, name: \"{}\", email: \"{}\"}}",
            self.id, self.name, self.email
        )
    }
}
