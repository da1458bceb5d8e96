use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A thin wrapper that keeps sensitive values (working keys, salts, API keys) out of logs.
///
/// The inner value is only accessible through an explicit [`Secret::reveal`] call, and both `Debug` and `Display`
/// render as a mask.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Hand out the wrapped value. Call sites make the access auditable.
    pub fn reveal(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> From<T> for Secret<T> {
    fn from(inner: T) -> Self {
        Self::new(inner)
    }
}

impl<T> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secrets_do_not_leak_via_formatting() {
        let key = Secret::new("super-secret-working-key".to_string());
        assert_eq!(format!("{key}"), "****");
        assert_eq!(format!("{key:?}"), "****");
        assert_eq!(key.reveal(), "super-secret-working-key");
    }
}
