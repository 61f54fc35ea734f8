//! Background network calls for the TUI.
//!
//! Each backend call runs on its own short-lived thread and reports back over
//! an `mpsc` channel, which the event loop polls with `try_recv()` once per
//! tick. The UI thread never blocks on the network.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use crate::client::{ClientError, ClientResult, QaBackend};
use crate::page::RequestTicket;
use crate::types::{BooksResponse, QueryRequest, QueryResponse};

/// Outcome of a background call.
#[derive(Debug)]
pub enum WorkerEvent {
    Books(ClientResult<BooksResponse>),
    Answer {
        ticket: RequestTicket,
        result: ClientResult<QueryResponse>,
    },
}

/// Spawns backend calls and collects their outcomes.
pub struct Worker {
    backend: Arc<dyn QaBackend>,
    tx: mpsc::Sender<WorkerEvent>,
    rx: mpsc::Receiver<WorkerEvent>,
}

impl Worker {
    pub fn new(backend: Arc<dyn QaBackend>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { backend, tx, rx }
    }

    /// Fetch the book list in the background.
    pub fn spawn_book_load(&self) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("books-loader".into())
            .spawn(move || {
                let _ = tx.send(WorkerEvent::Books(backend.fetch_books()));
            });
        if let Err(e) = spawned {
            let _ = self
                .tx
                .send(WorkerEvent::Books(Err(spawn_failure("/books", e))));
        }
    }

    /// Send `request` in the background; the outcome carries `ticket`.
    pub fn spawn_query(&self, ticket: RequestTicket, request: QueryRequest) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("query-{}", ticket.sequence()))
            .spawn(move || {
                let result = backend.query(&request);
                let _ = tx.send(WorkerEvent::Answer { ticket, result });
            });
        if let Err(e) = spawned {
            let _ = self.tx.send(WorkerEvent::Answer {
                ticket,
                result: Err(spawn_failure("/query", e)),
            });
        }
    }

    /// Next finished call, if any. Never blocks.
    pub fn try_recv(&self) -> Option<WorkerEvent> {
        self.rx.try_recv().ok()
    }
}

fn spawn_failure(path: &str, e: std::io::Error) -> ClientError {
    ClientError::Request {
        url: path.to_string(),
        message: format!("failed to spawn worker thread: {e}"),
    }
}
