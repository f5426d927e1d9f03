//! GitHub event payload types and the message formatting the receiver
//! applies before anything leaves the process.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub repository: Repository,
}

#[derive(Debug, Default, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueEvent {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub issue: Issue,
    #[serde(default)]
    pub comment: Option<Comment>,
    #[serde(default)]
    pub repository: Repository,
    #[serde(default)]
    pub sender: Sender,
}

#[derive(Debug, Default, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub login: Option<String>,
}

/// One commit, formatted for humans plus the raw record handed to the
/// changelog generator.
#[derive(Debug)]
pub struct CommitLine {
    pub formatted: String,
    pub raw: Value,
}

/// Formats every commit of a push event. One entry per commit; an empty
/// commit list formats to nothing.
pub fn format_push(event: &PushEvent) -> Vec<CommitLine> {
    let repository = event.repository.name.as_deref().unwrap_or("unknown");
    let branch = event.git_ref.rsplit('/').next().unwrap_or("");

    event
        .commits
        .iter()
        .map(|commit| {
            let id: String = commit.id.chars().take(7).collect();
            let author = commit.author.name.as_deref().unwrap_or("Unknown");

            let formatted = format!(
                "{id}\n[{repository}:{branch}] 1 new commit\n{} - {author}",
                commit.message
            );
            let raw = json!({
                "id": id,
                "repo": repository,
                "branch": branch,
                "message": commit.message,
                "author": author,
                "timestamp": commit
                    .timestamp
                    .clone()
                    .unwrap_or_else(|| Utc::now().to_rfc3339()),
            });

            CommitLine { formatted, raw }
        })
        .collect()
}

/// Formats an issues / issue_comment event into a single message.
pub fn format_issue(event: &IssueEvent, event_type: &str) -> String {
    let repository = event.repository.full_name.as_deref().unwrap_or("unknown");
    let sender = event.sender.login.as_deref().unwrap_or("unknown");
    let number = event
        .issue
        .number
        .map(|n| n.to_string())
        .unwrap_or_else(|| "?".to_string());

    match event_type {
        "issues" => {
            let action = event.action.as_deref().unwrap_or("unknown");
            format!(
                "{sender}\n[{repository}] Issue {action}: #{number} {}\n{}",
                event.issue.title, event.issue.body
            )
        }
        "issue_comment" => {
            let comment = event.comment.as_ref().map(|c| c.body.as_str()).unwrap_or("");
            format!(
                "{sender}\n[{repository}] New comment on issue #{number}: {}\n{comment}",
                event.issue.title
            )
        }
        _ => format!("Unsupported event type: {event_type}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn push_payload() -> PushEvent {
        serde_json::from_value(json!({
            "ref": "refs/heads/main",
            "repository": { "name": "nong-bot" },
            "commits": [{
                "id": "0123456789abcdef",
                "message": "fix playback loop",
                "author": { "name": "Alice" },
                "timestamp": "2025-01-01T00:00:00Z"
            }]
        }))
        .unwrap()
    }

    #[test]
    fn one_commit_formats_to_exactly_one_line() {
        let lines = format_push(&push_payload());

        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].formatted,
            "0123456\n[nong-bot:main] 1 new commit\nfix playback loop - Alice"
        );
        assert_eq!(lines[0].raw["id"], "0123456");
        assert_eq!(lines[0].raw["repo"], "nong-bot");
        assert_eq!(lines[0].raw["branch"], "main");
        assert_eq!(lines[0].raw["timestamp"], "2025-01-01T00:00:00Z");
    }

    #[test]
    fn branch_is_the_last_ref_segment() {
        let event: PushEvent =
            serde_json::from_value(json!({ "ref": "refs/heads/feature/webhooks" })).unwrap();
        let lines = format_push(&event);
        assert!(lines.is_empty());

        let event: PushEvent = serde_json::from_value(json!({
            "ref": "refs/heads/feature/webhooks",
            "commits": [{ "id": "abc" }]
        }))
        .unwrap();
        assert_eq!(format_push(&event)[0].raw["branch"], "webhooks");
    }

    #[test]
    fn missing_fields_fall_back_to_placeholders() {
        let event: PushEvent =
            serde_json::from_value(json!({ "commits": [{}] })).unwrap();
        let lines = format_push(&event);

        assert_eq!(lines[0].raw["repo"], "unknown");
        assert_eq!(lines[0].raw["author"], "Unknown");
        // Missing timestamp is replaced with the receive time.
        assert!(!lines[0].raw["timestamp"].as_str().unwrap().is_empty());
    }

    #[test]
    fn formats_issue_events() {
        let event: IssueEvent = serde_json::from_value(json!({
            "action": "opened",
            "repository": { "full_name": "org/nong-bot" },
            "sender": { "login": "alice" },
            "issue": { "number": 7, "title": "Bot skips tracks", "body": "repro steps" }
        }))
        .unwrap();

        assert_eq!(
            format_issue(&event, "issues"),
            "alice\n[org/nong-bot] Issue opened: #7 Bot skips tracks\nrepro steps"
        );
    }

    #[test]
    fn formats_issue_comments() {
        let event: IssueEvent = serde_json::from_value(json!({
            "repository": { "full_name": "org/nong-bot" },
            "sender": { "login": "bob" },
            "issue": { "number": 7, "title": "Bot skips tracks" },
            "comment": { "body": "same here" }
        }))
        .unwrap();

        assert_eq!(
            format_issue(&event, "issue_comment"),
            "bob\n[org/nong-bot] New comment on issue #7: Bot skips tracks\nsame here"
        );
    }

    #[test]
    fn unknown_event_type_is_reported() {
        let event = IssueEvent::default();
        assert_eq!(
            format_issue(&event, "pull_request"),
            "Unsupported event type: pull_request"
        );
    }

    #[test]
    fn missing_issue_number_renders_question_mark() {
        let event: IssueEvent = serde_json::from_value(json!({
            "issue": { "title": "no number" }
        }))
        .unwrap();
        assert!(format_issue(&event, "issues").contains("#? no number"));
    }
}
