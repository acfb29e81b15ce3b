//! Request modes: how the acknowledgement of a sent request is handled.

use std::fmt;

use serde::Deserialize;

use super::PendingReply;
use crate::error::RequestError;

/// Strategy applied to every window request after it has been sent.
///
/// There is a single code path per lifecycle operation; the mode only decides
/// what happens to the reply.
pub trait RequestMode: fmt::Debug {
    /// Resolves the pending acknowledgement of a request.
    fn settle(&self, pending: Box<dyn PendingReply + '_>) -> Result<(), RequestError>;

    /// Whether `settle` waits for the server.
    ///
    /// Unchecked requests may still sit in the output buffer after `settle`
    /// returns, so callers flush the connection when this is `false`.
    fn is_checked(&self) -> bool;
}

/// Waits for the server's reply and surfaces any error synchronously.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checked;

/// Trusts the request to succeed; errors surface out of band or not at all.
///
/// Saves one round trip per request at the cost of error reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unchecked;

impl RequestMode for Checked {
    fn settle(&self, pending: Box<dyn PendingReply + '_>) -> Result<(), RequestError> {
        pending.check()
    }

    fn is_checked(&self) -> bool {
        true
    }
}

impl RequestMode for Unchecked {
    fn settle(&self, pending: Box<dyn PendingReply + '_>) -> Result<(), RequestError> {
        pending.detach();
        Ok(())
    }

    fn is_checked(&self) -> bool {
        false
    }
}

/// Configuration-level selection of a [`RequestMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestModeKind {
    #[default]
    Checked,
    Unchecked,
}

impl RequestModeKind {
    pub fn strategy(self) -> &'static dyn RequestMode {
        match self {
            RequestModeKind::Checked => &Checked,
            RequestModeKind::Unchecked => &Unchecked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerRejection;
    use std::cell::Cell;

    struct Scripted<'a> {
        reply: Option<ServerRejection>,
        checked: &'a Cell<bool>,
        detached: &'a Cell<bool>,
    }

    impl PendingReply for Scripted<'_> {
        fn check(self: Box<Self>) -> Result<(), RequestError> {
            self.checked.set(true);
            match self.reply {
                Some(rejection) => Err(RequestError::Rejected(rejection)),
                None => Ok(()),
            }
        }

        fn detach(self: Box<Self>) {
            self.detached.set(true);
        }
    }

    fn value_error() -> ServerRejection {
        ServerRejection { error_code: 2, kind: "Value".to_string(), bad_value: 0, sequence: 1 }
    }

    #[test]
    fn test_checked_mode_surfaces_rejection() {
        let (checked, detached) = (Cell::new(false), Cell::new(false));
        let pending = Box::new(Scripted { reply: Some(value_error()), checked: &checked, detached: &detached });

        let result = Checked.settle(pending);

        assert!(matches!(result, Err(RequestError::Rejected(ref r)) if r.kind == "Value"));
        assert!(checked.get());
        assert!(!detached.get());
    }

    #[test]
    fn test_unchecked_mode_swallows_rejection() {
        let (checked, detached) = (Cell::new(false), Cell::new(false));
        let pending = Box::new(Scripted { reply: Some(value_error()), checked: &checked, detached: &detached });

        assert!(Unchecked.settle(pending).is_ok());
        assert!(!checked.get());
        assert!(detached.get());
    }

    #[test]
    fn test_mode_kind_selects_strategy() {
        assert!(RequestModeKind::Checked.strategy().is_checked());
        assert!(!RequestModeKind::Unchecked.strategy().is_checked());
        assert_eq!(RequestModeKind::default(), RequestModeKind::Checked);
    }

    #[test]
    fn test_mode_kind_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Holder {
            mode: RequestModeKind,
        }
        let holder: Holder = toml::from_str("mode = \"unchecked\"").unwrap();
        assert_eq!(holder.mode, RequestModeKind::Unchecked);
    }
}
