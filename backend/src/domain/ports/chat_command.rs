//! Driving port for the chat orchestration.

use async_trait::async_trait;

use crate::domain::Error;
use crate::domain::chat::{ChatEventSender, ChatReply, ChatRequest, PreparedTurn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCommand: Send + Sync {
    /// Validate the message and resolve history, checking that any
    /// referenced conversation belongs to the reader.
    async fn prepare(&self, request: ChatRequest) -> Result<PreparedTurn, Error>;

    /// Run a prepared turn, reporting progress through `events`.
    async fn run(&self, turn: PreparedTurn, events: ChatEventSender) -> Result<ChatReply, Error>;

    /// Prepare and run one chat turn.
    async fn chat(
        &self,
        request: ChatRequest,
        events: ChatEventSender,
    ) -> Result<ChatReply, Error> {
        let turn = self.prepare(request).await?;
        self.run(turn, events).await
    }
}
