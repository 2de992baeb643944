use std::fmt::Debug;

use log::debug;

use crate::{Action, Params};

/// Observe receives the intermediate values of every signed call.
///
/// The client only reports to its observer when `verbose` is enabled in the
/// config. All methods default to doing nothing.
pub trait Observe: Debug + Send + Sync + 'static {
    /// Called with the string that is about to be signed.
    fn string_to_sign(&self, _action: Action, _url: &str, _s: &str) {}

    /// Called with the computed signature.
    fn signature(&self, _action: Action, _url: &str, _signature: &str) {}

    /// Called with the final parameters, signature included.
    fn params(&self, _action: Action, _url: &str, _params: &Params) {}
}

/// LogObserver writes every step at `debug` level through [`log`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observe for LogObserver {
    fn string_to_sign(&self, action: Action, url: &str, s: &str) {
        debug!("{action} {url}: string to sign: {s}");
    }

    fn signature(&self, action: Action, url: &str, signature: &str) {
        debug!("{action} {url}: signature: {signature}");
    }

    fn params(&self, action: Action, url: &str, params: &Params) {
        debug!("{action} {url}: params: {params:?}");
    }
}
