use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::session::Message;

/// Asynchronous work requested by [`Session::update`](super::Session::update).
///
/// Each future resolves to the message fed back into the session.
#[must_use = "commands do nothing unless handed to a runtime"]
pub struct Command {
    futures: Vec<BoxFuture<'static, Message>>,
}

impl Command {
    pub fn none() -> Self {
        Self { futures: Vec::new() }
    }

    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Message + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            futures: vec![future.map(map).boxed()],
        }
    }

    pub fn batch(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            futures: commands.into_iter().flat_map(|c| c.futures).collect(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.futures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.futures.len()
    }

    pub fn into_futures(self) -> Vec<BoxFuture<'static, Message>> {
        self.futures
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("pending", &self.futures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn perform_maps_output_into_message() {
        let cmd = Command::perform(async { 41 + 1 }, |n: i64| Message::AgeChanged(n));
        assert_eq!(cmd.len(), 1);

        let messages = futures::future::join_all(cmd.into_futures()).await;
        assert!(matches!(messages.as_slice(), [Message::AgeChanged(42)]));
    }

    #[test]
    fn batch_flattens() {
        let cmd = Command::batch([
            Command::none(),
            Command::perform(async {}, |_| Message::Reset),
            Command::perform(async {}, |_| Message::Submit),
        ]);
        assert_eq!(cmd.len(), 2);
        assert!(Command::none().is_none());
    }
}
