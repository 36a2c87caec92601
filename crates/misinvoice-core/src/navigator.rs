//! Imperative "navigate to path" primitive.
//!
//! Timers and the session controller request navigation through this
//! trait; the front end decides when to apply it. The channel flavour
//! lets spawned tasks hand requests back to the main loop.

use tokio::sync::mpsc;
use tracing::debug;

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Sends requested paths to the receiver returned by [`ChannelNavigator::new`].
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, path: &str) {
        if self.tx.send(path.to_string()).is_err() {
            debug!(path, "Navigation dropped, receiver closed");
        }
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingNavigator;

#[cfg(test)]
mod recording {
    use std::sync::{Arc, Mutex};

    use super::Navigator;

    /// Records every requested path.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingNavigator {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingNavigator {
        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.calls.lock().unwrap().push(path.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_navigator_delivers_in_order() {
        let (nav, mut rx) = ChannelNavigator::new();
        nav.navigate("/login");
        nav.navigate("/dashboard");
        assert_eq!(rx.try_recv().unwrap(), "/login");
        assert_eq!(rx.try_recv().unwrap(), "/dashboard");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_navigator_survives_closed_receiver() {
        let (nav, rx) = ChannelNavigator::new();
        drop(rx);
        nav.navigate("/login");
    }
}
