use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadInfo {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RunInfo {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Completed,
    Failed,
    Expired,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageList {
    pub data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadMessage {
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

/// One content part of a thread message. Only `text` parts carry an answer;
/// other kinds (images and whatever the service adds next) are skipped.
#[derive(Debug, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    /// Placeholder span inside the message text that this annotation stands for
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url_citation: Option<UrlCitation>,
}

#[derive(Debug, Deserialize)]
pub struct UrlCitation {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl ThreadMessage {
    /// The message text with every url-citation placeholder replaced by an
    /// inline markdown link, ready for display.
    pub fn resolved_text(&self) -> Option<String> {
        let text = self.content.iter().find_map(|part| text_part(part))?;

        let mut resolved = text.value.clone();
        for annotation in &text.annotations {
            if annotation.kind != "url_citation" {
                continue;
            }
            let Some(citation) = annotation.url_citation.as_ref() else {
                continue;
            };
            if annotation.text.is_empty() {
                continue;
            }

            let title = if citation.title.is_empty() {
                citation.url.as_str()
            } else {
                citation.title.as_str()
            };
            let link = format!(" [{}]({})", title, citation.url);
            resolved = resolved.replace(&annotation.text, &link);
        }

        Some(resolved)
    }
}

fn text_part(part: &MessageContent) -> Option<&TextContent> {
    if part.kind == "text" {
        part.text.as_ref()
    } else {
        None
    }
}
