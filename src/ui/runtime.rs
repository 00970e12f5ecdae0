use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::trace;

use super::command::Command;
use super::session::{Message, Session};

/// Drives a [`Session`] on the current task.
///
/// Pending commands are polled together, so the liveness probe and an
/// analysis call can overlap while the session stays the single owner of
/// all state.
pub struct Runtime {
    session: Session,
    pending: FuturesUnordered<BoxFuture<'static, Message>>,
}

impl Runtime {
    pub fn new(session: Session, initial: Command) -> Self {
        let mut runtime = Self {
            session,
            pending: FuturesUnordered::new(),
        };
        runtime.enqueue(initial);
        runtime
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn dispatch(&mut self, message: Message) {
        let command = self.session.update(message);
        self.enqueue(command);
    }

    /// Waits for one pending command and feeds its message back.
    ///
    /// Returns false when nothing is pending.
    pub async fn step(&mut self) -> bool {
        match self.pending.next().await {
            Some(message) => {
                trace!(?message, "Command completed");
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    /// Runs until no command is pending.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    fn enqueue(&mut self, command: Command) {
        for future in command.into_futures() {
            self.pending.push(future);
        }
    }
}
