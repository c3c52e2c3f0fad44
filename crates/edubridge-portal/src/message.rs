// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outgoing timeline messages.

use edubridge_core::PortalError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const MESSAGE_TYPE: &str = "sprava";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,
    /// Generated from the option's position when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub multiple: bool,
}

/// What to send and how recipients may react.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageOptions {
    pub text: String,
    /// Ask recipients to confirm they have read the message.
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub allow_replies: bool,
    #[serde(default)]
    pub replies_to_author_only: bool,
    /// Attachment descriptors as returned by the portal's upload endpoint.
    #[serde(default)]
    pub attachments: Vec<Value>,
    #[serde(default)]
    pub poll: Option<Poll>,
}

fn flag(on: bool) -> String {
    String::from(if on { "1" } else { "0" })
}

/// Form fields for `timeline/?akcia=createItem`.
pub(crate) fn message_form(
    recipient: &str,
    options: &MessageOptions,
) -> Result<Vec<(&'static str, String)>, PortalError> {
    let attachments = options
        .attachments
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PortalError::Internal(format!("failed to encode attachment: {e}")))?
        .join(",");

    let mut fields = vec![
        ("attachments", attachments),
        ("receipt", flag(options.important)),
        ("repliesDisabled", flag(!options.allow_replies)),
        (
            "repliesToAllDisabled",
            flag(!options.allow_replies || options.replies_to_author_only),
        ),
        ("selectedUser", recipient.to_string()),
        ("text", options.text.clone()),
        ("typ", MESSAGE_TYPE.to_string()),
    ];

    if let Some(poll) = &options.poll
        && !poll.options.is_empty()
    {
        let answers: Vec<Value> = poll
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                let id = option
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("{:x}", index + 1));
                json!({ "text": option.text, "id": id })
            })
            .collect();
        let voting = json!({ "answers": answers, "multiple": poll.multiple });
        fields.push(("votingParams", voting.to_string()));
    }

    Ok(fields)
}
