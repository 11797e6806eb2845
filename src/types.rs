use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Joke,
    Quote,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Joke => "joke",
            ContentKind::Quote => "quote",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single piece of content handed back to the client.
///
/// Serializes as `{"type": "joke", "content": ...}` or
/// `{"type": "quote", "content": ..., "author": ...}`. Jokes carry no author.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentResult {
    Joke { content: String },
    Quote { content: String, author: String },
}

impl ContentResult {
    pub fn joke<S>(content: S) -> Self
    where
        S: Into<String>,
    {
        ContentResult::Joke {
            content: content.into(),
        }
    }

    pub fn quote<S, A>(content: S, author: A) -> Self
    where
        S: Into<String>,
        A: Into<String>,
    {
        ContentResult::Quote {
            content: content.into(),
            author: author.into(),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentResult::Joke { .. } => ContentKind::Joke,
            ContentResult::Quote { .. } => ContentKind::Quote,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ContentResult::Joke { content } | ContentResult::Quote { content, .. } => content,
        }
    }

    pub fn author(&self) -> Option<&str> {
        match self {
            ContentResult::Joke { .. } => None,
            ContentResult::Quote { author, .. } => Some(author),
        }
    }
}

#[derive(PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum MessageType {
    System,
    User,
    Assistant,
}

impl MessageType {
    pub fn role(&self) -> &'static str {
        match self {
            MessageType::System => "system",
            MessageType::User => "user",
            MessageType::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub message_type: MessageType,
    pub content: String,
}

impl Message {
    pub fn user<S>(content: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message_type: MessageType::User,
            content: content.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "role": self.message_type.role(),
            "content": self.content,
        })
    }
}

/// One element of the quotes provider's response array.
#[derive(Clone, Debug, Deserialize)]
pub struct ZenQuote {
    /// Quote text
    pub q: String,
    /// Author
    pub a: String,
}
