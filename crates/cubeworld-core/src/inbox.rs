//! Deferred scene imports.
//!
//! Session workers must not change world topology, so an import request is
//! only validated and queued here. The tick thread drains the queue between
//! ticks and applies each record with the scene loader.

use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender, TrySendError};

/// One queued import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRequest {
    /// Read and apply a scene file.
    File(PathBuf),
    /// Apply an inline scene document.
    Object(String),
}

impl ImportRequest {
    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => format!("file {}", path.display()),
            Self::Object(text) => format!("object ({} bytes)", text.len()),
        }
    }
}

/// Why an import could not be queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InboxError {
    /// The inbox holds its maximum number of pending imports.
    #[error("import inbox is full ({capacity} pending)")]
    Full {
        /// Inbox capacity.
        capacity: usize,
    },

    /// The tick thread is gone.
    #[error("import inbox is closed")]
    Closed,
}

/// Bounded queue of imports waiting for the tick thread.
#[derive(Debug, Clone)]
pub struct ImportInbox {
    tx: Sender<ImportRequest>,
    rx: Receiver<ImportRequest>,
    capacity: usize,
}

impl ImportInbox {
    /// An inbox that holds at most `capacity` imports (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// Queue an import without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Full`] when the queue is at capacity.
    pub fn submit(&self, request: ImportRequest) -> Result<(), InboxError> {
        match self.tx.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(request)) => {
                tracing::warn!(request = %request.describe(), capacity = self.capacity, "import inbox full");
                Err(InboxError::Full {
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Disconnected(_)) => Err(InboxError::Closed),
        }
    }

    /// Take every pending import, oldest first.
    pub fn drain(&self) -> Vec<ImportRequest> {
        self.rx.try_iter().collect()
    }

    /// Number of pending imports.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order() {
        let inbox = ImportInbox::new(4);
        inbox.submit(ImportRequest::File(PathBuf::from("a.json"))).unwrap();
        inbox.submit(ImportRequest::Object("{}".to_owned())).unwrap();
        assert_eq!(inbox.len(), 2);
        let drained = inbox.drain();
        assert_eq!(
            drained,
            vec![
                ImportRequest::File(PathBuf::from("a.json")),
                ImportRequest::Object("{}".to_owned())
            ]
        );
        assert!(inbox.is_empty());
    }

    #[test]
    fn rejects_on_overflow() {
        let inbox = ImportInbox::new(1);
        inbox.submit(ImportRequest::Object("{}".to_owned())).unwrap();
        assert_eq!(
            inbox.submit(ImportRequest::Object("{}".to_owned())),
            Err(InboxError::Full { capacity: 1 })
        );
    }
}
