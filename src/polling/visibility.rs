use tokio::sync::watch;

/// "Is the application in the foreground" flag with change notifications.
///
/// The host window layer owns the signal and calls [`set`](Self::set) on
/// focus/minimize events; consumers hold receivers from
/// [`subscribe`](Self::subscribe).
#[derive(Debug, Clone)]
pub struct VisibilitySignal {
    tx: watch::Sender<bool>,
}

impl VisibilitySignal {
    pub fn new(visible: bool) -> Self {
        let (tx, _rx) = watch::channel(visible);
        Self { tx }
    }

    pub fn set(&self, visible: bool) {
        // send_if_modified so repeated identical values do not wake receivers
        self.tx.send_if_modified(|current| {
            if *current == visible {
                false
            } else {
                *current = visible;
                true
            }
        });
    }

    pub fn is_visible(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for VisibilitySignal {
    fn default() -> Self {
        Self::new(true)
    }
}
