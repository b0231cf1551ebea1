//! Rebuilds model history from a stored conversation.
//!
//! Book cards are stored beside assistant messages rather than in their text,
//! so the text alone loses what "the second one" referred to. Each assistant
//! turn that showed books gets a compact numbered listing appended.

use super::HistoryTurn;
use crate::domain::{Message, MessageRole};

/// Marker that introduces the appended book listing.
pub const BOOKS_SHOWN_PREFIX: &str = "[Books shown:";

/// Convert stored messages (oldest first) into history turns.
pub fn history_from_messages(messages: &[Message]) -> Vec<HistoryTurn> {
    messages
        .iter()
        .map(|message| HistoryTurn {
            role: message.role.as_str().to_owned(),
            content: turn_content(message),
        })
        .collect()
}

fn turn_content(message: &Message) -> String {
    if message.role != MessageRole::Assistant || message.books.is_empty() {
        return message.content.clone();
    }
    let listing = message
        .books
        .iter()
        .enumerate()
        .map(|(index, book)| {
            let authors = if book.authors.is_empty() {
                String::new()
            } else {
                format!(" by {}", book.authors.join(", "))
            };
            format!("{}. {}{} (bookId: {})", index + 1, book.title, authors, book.id)
        })
        .collect::<Vec<_>>()
        .join("; ");
    let content = message.content.trim_end();
    if content.is_empty() {
        format!("{BOOKS_SHOWN_PREFIX} {listing}]")
    } else {
        format!("{content}\n\n{BOOKS_SHOWN_PREFIX} {listing}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Book, ConversationId, NewMessage};
    use chrono::Utc;

    fn book(id: &str, title: &str, authors: &[&str]) -> Book {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "authors": authors,
        }))
        .expect("book")
    }

    #[test]
    fn assistant_turns_list_the_books_they_showed() {
        let conversation = ConversationId::random();
        let messages = vec![
            NewMessage::from_parts(MessageRole::User, "fantasy please", Vec::new())
                .into_message(conversation, Utc::now()),
            NewMessage::from_parts(
                MessageRole::Assistant,
                "Here are two.",
                vec![book("a1", "Mistborn", &["Brandon Sanderson"]), book("b2", "Anon", &[])],
            )
            .into_message(conversation, Utc::now()),
        ];

        let turns = history_from_messages(&messages);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns.first().map(|t| t.content.as_str()), Some("fantasy please"));
        assert_eq!(
            turns.get(1).map(|t| t.content.as_str()),
            Some(
                "Here are two.\n\n[Books shown: 1. Mistborn by Brandon Sanderson (bookId: a1); \
                 2. Anon (bookId: b2)]"
            )
        );
    }
}
