//! Ordered, append-only conversation log.

use super::message::{Message, TranscriptEntry};
use crate::error::ValidationError;
use serde::Serialize;

const LOG_PREVIEW_CHARS: usize = 100;

/// Holds the conversation in insertion order.
///
/// The log only grows, except for [`MessageStore::clear`] which empties it
/// on reset. Stored messages are never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the end of the log.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyContent`] if the message has no content.
    pub fn append(&mut self, message: Message) -> Result<(), ValidationError> {
        if message.content().is_empty() {
            return Err(ValidationError::EmptyContent);
        }

        let preview: String = message.content().chars().take(LOG_PREVIEW_CHARS).collect();
        tracing::info!(role = %message.role(), "Added message: {}...", preview);

        self.messages.push(message);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The user/assistant subsequence of the log, as sent to the backend.
    ///
    /// The iterator borrows the log and can be recreated at any time.
    pub fn transcript(&self) -> impl Iterator<Item = TranscriptEntry<'_>> + Clone + '_ {
        self.messages
            .iter()
            .filter(|message| message.role().is_conversational())
            .map(|message| TranscriptEntry {
                role: message.role(),
                content: message.content(),
            })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a MessageStore {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::{MessageMetadata, MessageRole};

    #[test]
    fn test_append_keeps_order() {
        let mut store = MessageStore::new();
        store.append(Message::user("first")).unwrap();
        store
            .append(Message::assistant("second", MessageMetadata::default()))
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().content(), "first");
        assert_eq!(store.last().unwrap().content(), "second");
    }

    #[test]
    fn test_append_rejects_empty_content() {
        let mut store = MessageStore::new();
        assert_eq!(
            store.append(Message::user("")),
            Err(ValidationError::EmptyContent)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_transcript_skips_system_messages() {
        let mut store = MessageStore::new();
        store.append(Message::system("welcome")).unwrap();
        store.append(Message::user("q1")).unwrap();
        store.append(Message::system("Error: timeout")).unwrap();
        store
            .append(Message::assistant("a1", MessageMetadata::default()))
            .unwrap();
        store.append(Message::system("fallback")).unwrap();

        let transcript: Vec<_> = store.transcript().collect();
        assert_eq!(transcript.len(), 2);
        assert!(transcript.iter().all(|e| e.role != MessageRole::System));
        assert_eq!(transcript[0].content, "q1");
        assert_eq!(transcript[1].content, "a1");
    }

    #[test]
    fn test_transcript_is_restartable() {
        let mut store = MessageStore::new();
        store.append(Message::user("q")).unwrap();

        let transcript = store.transcript();
        assert_eq!(transcript.clone().count(), 1);
        assert_eq!(transcript.count(), 1);
        assert_eq!(store.transcript().count(), 1);
    }

    #[test]
    fn test_clear_empties_log() {
        let mut store = MessageStore::new();
        store.append(Message::user("q")).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.transcript().count(), 0);
    }
}
