// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Files attached to an e-learning homework card.
//!
//! The material player answers with `materialData.cardsData`, a map of cards
//! whose `content` is itself a JSON string holding `widgets[].props.files[]`.

use std::collections::BTreeMap;

use edubridge_core::PortalError;
use serde_json::Value;

fn unobtainable(what: &str) -> PortalError {
    PortalError::decode(format!("homework material has no {what}"))
}

/// File name to download link for every file widget on every card.
pub fn parse_material_attachments(json: &[u8]) -> Result<BTreeMap<String, String>, PortalError> {
    let root: Value = serde_json::from_slice(json)
        .map_err(|e| PortalError::decode_with("homework material is not JSON", e))?;

    let cards = root
        .get("materialData")
        .and_then(|material| material.get("cardsData"))
        .and_then(Value::as_object)
        .ok_or_else(|| unobtainable("cards"))?;

    let mut attachments = BTreeMap::new();
    for card in cards.values() {
        let content = card
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| unobtainable("card content"))?;
        let content: Value = serde_json::from_str(content)
            .map_err(|e| PortalError::decode_with("card content is not JSON", e))?;
        let widgets = content
            .get("widgets")
            .and_then(Value::as_array)
            .ok_or_else(|| unobtainable("widgets"))?;

        let files = widgets
            .iter()
            .filter_map(|widget| widget.get("props")?.get("files")?.as_array())
            .flatten();
        for file in files {
            if let (Some(name), Some(src)) = (
                file.get("name").and_then(Value::as_str),
                file.get("src").and_then(Value::as_str),
            ) {
                attachments.insert(name.to_string(), src.to_string());
            }
        }
    }
    Ok(attachments)
}
