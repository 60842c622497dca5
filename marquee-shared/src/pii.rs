use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps a personal identifier so that `Debug`/`Display` (and therefore every
/// `tracing` field) print a redacted form. Serialization keeps the real value
/// because the wrapped data still has to reach the reservation service.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> Masked<T> {
    /// First two characters followed by a fixed mask, enough to correlate log lines.
    pub fn hint(&self) -> String {
        let prefix: String = self.0.to_string().chars().take(2).collect();
        format!("{}****", prefix)
    }
}

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hint())
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hint())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }
}
