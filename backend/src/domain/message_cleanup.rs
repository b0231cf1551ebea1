//! Maintenance job removing duplicate chat messages.
//!
//! Messages written before the save path deduplicated can repeat: same
//! role, same content, same creation second. The job keeps the oldest of
//! each group and resets the conversation's `message_count`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::ConversationId;
use crate::domain::conversation::duplicate_message_ids;
use crate::domain::ports::{ConversationRepository, ConversationRepositoryError};

/// Outcome for one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationCleanup {
    pub conversation_id: ConversationId,
    pub total_messages: usize,
    pub duplicates: usize,
    /// Message count after the job; equals `total_messages - duplicates`.
    pub remaining: i64,
}

/// Summary of a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub conversations: Vec<ConversationCleanup>,
}

impl CleanupReport {
    pub fn total_duplicates(&self) -> usize {
        self.conversations.iter().map(|c| c.duplicates).sum()
    }
}

/// Walks every conversation and removes repeated messages.
pub struct DuplicateMessageCleaner<R> {
    repo: Arc<R>,
}

impl<R> DuplicateMessageCleaner<R>
where
    R: ConversationRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Scan all conversations; with `dry_run` nothing is deleted.
    ///
    /// # Errors
    ///
    /// Returns the first repository failure; conversations processed before
    /// it stay cleaned.
    pub async fn run(&self, dry_run: bool) -> Result<CleanupReport, ConversationRepositoryError> {
        let mut report = CleanupReport {
            dry_run,
            conversations: Vec::new(),
        };
        for conversation_id in self.repo.list_all_ids().await? {
            let messages = self.repo.list_messages(&conversation_id).await?;
            let duplicates = duplicate_message_ids(&messages);
            let total_messages = messages.len();
            let expected_remaining =
                i64::try_from(total_messages - duplicates.len()).unwrap_or(i64::MAX);

            let remaining = if duplicates.is_empty() || dry_run {
                expected_remaining
            } else {
                self.repo
                    .remove_messages(&conversation_id, &duplicates)
                    .await?
            };
            if duplicates.is_empty() {
                debug!(%conversation_id, total_messages, "no duplicate messages");
            } else {
                info!(
                    %conversation_id,
                    total_messages,
                    duplicates = duplicates.len(),
                    dry_run,
                    "duplicate messages found"
                );
            }
            report.conversations.push(ConversationCleanup {
                conversation_id,
                total_messages,
                duplicates: duplicates.len(),
                remaining,
            });
        }
        Ok(report)
    }
}
