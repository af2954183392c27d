use std::fmt::Write;

use super::{CollectionSummary, FieldDescriptions, SchemaReport};

pub fn render_markdown(report: &SchemaReport, descriptions: &FieldDescriptions) -> String {
    let mut out = String::new();

    out.push_str("# Database Structure\n\n");
    out.push_str("This document describes the collections and documents stored in the ELIO database.\n\n");
    let _ = writeln!(
        out,
        "_Generated automatically on {} UTC_\n",
        report.generated_at.format("%Y-%m-%d at %H:%M")
    );

    out.push_str("## Overview\n\n");
    out.push_str("The database contains the following top-level collections:\n\n");
    for collection in &report.collections {
        let _ = writeln!(out, "- `{}`", collection.name);
    }
    out.push_str("\n## Collection details\n\n");

    for collection in &report.collections {
        render_collection(&mut out, collection, descriptions, 0);
    }
    out
}

fn render_collection(out: &mut String, summary: &CollectionSummary, descriptions: &FieldDescriptions, depth: usize) {
    let heading = "#".repeat((depth + 2).min(6));
    let _ = writeln!(out, "{} Collection: `{}`\n", heading, summary.name);
    if depth > 0 {
        out.push_str("_Sub-collection_\n\n");
    }

    if let Some(error) = &summary.error {
        let _ = writeln!(out, "> Could not be fully read: {}\n", escape(error));
    }

    if summary.is_empty() {
        if summary.error.is_none() {
            out.push_str("_No documents found_\n\n");
        }
    } else {
        let _ = writeln!(out, "_{} document(s) sampled_\n", summary.sampled);
        out.push_str("| Field | Type(s) | Description |\n|-------|---------|-------------|\n");
        for (field, info) in &summary.fields {
            let _ = writeln!(
                out,
                "| `{}` | {} | {} |",
                escape(field),
                info.kinds.iter().map(ToString::to_string).collect::<Vec<_>>().join(" or "),
                escape(descriptions.describe(&summary.name, field))
            );
        }
        out.push('\n');

        let relations: Vec<_> = summary
            .fields
            .iter()
            .filter(|(_, info)| !info.references.is_empty())
            .collect();
        if !relations.is_empty() {
            out.push_str("**Relations**\n\n");
            for (field, info) in relations {
                let targets = info.references.iter().map(|t| format!("`{}`", t)).collect::<Vec<_>>().join(", ");
                let _ = writeln!(out, "- `{}` references {}", escape(field), targets);
            }
            out.push('\n');
        }

        let examples: Vec<_> = summary
            .fields
            .iter()
            .filter(|(_, info)| !info.examples.is_empty())
            .collect();
        if !examples.is_empty() {
            out.push_str("**Examples**\n\n");
            for (field, info) in examples {
                let values = info
                    .examples
                    .iter()
                    .map(|v| format!("`{}`", escape(&v.to_string())))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(out, "- `{}`: {}", escape(field), values);
            }
            out.push('\n');
        }
    }

    if !summary.subcollections.is_empty() {
        let _ = writeln!(out, "{}# Sub-collections\n", heading);
        for child in &summary.subcollections {
            render_collection(out, child, descriptions, depth + 1);
        }
    }
}

/// Keeps free text from breaking table cells or code spans
fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('`', "'").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CollectionSummary, FieldSummary, CUSTOM_FIELD};
    use crate::store::CollectionPath;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn report(collections: Vec<CollectionSummary>) -> SchemaReport {
        SchemaReport {
            generated_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
            collections,
        }
    }

    fn collection(path: &str) -> CollectionSummary {
        CollectionSummary::new(&CollectionPath::parse(path).unwrap())
    }

    #[test]
    fn empty_collections_say_so() {
        let md = render_markdown(&report(vec![collection("professions")]), &FieldDescriptions::builtin());
        assert!(md.starts_with("# Database Structure"));
        assert!(md.contains("_Generated automatically on 2025-03-01 at 09:30 UTC_"));
        assert!(md.contains("- `professions`"));
        assert!(md.contains("_No documents found_"));
    }

    #[test]
    fn renders_fields_relations_and_subcollections() {
        let mut users = collection("users");
        users.sampled = 1;
        let mut email = FieldSummary::default();
        email.record(&json!("a@b.c"), 2);
        users.fields.insert("email".into(), email);
        let mut mood = FieldSummary::default();
        mood.record(&json!("x|y"), 2);
        mood.record(&json!(3), 2);
        users.fields.insert("mood".into(), mood);

        let mut conversations = collection("conversations");
        conversations.sampled = 1;
        let mut participants = FieldSummary::default();
        participants.record(&json!(["user-000000000000001"]), 2);
        participants.references.insert("users".into());
        conversations.fields.insert("participants".into(), participants);
        let mut messages = collection("conversations/c1/messages");
        messages.sampled = 1;
        messages.fields.entry("content".into()).or_default().record(&json!("hi"), 2);
        conversations.subcollections.push(messages);

        let md = render_markdown(&report(vec![users, conversations]), &FieldDescriptions::builtin());

        assert!(md.contains("| `email` | string | User email address |"));
        assert!(md.contains(&format!("| `mood` | string or number | {} |", CUSTOM_FIELD)));
        assert!(md.contains("- `mood`: `\"x\\|y\"`, `3`"));
        assert!(md.contains("- `participants` references `users`"));
        assert!(md.contains("### Sub-collections"));
        assert!(md.contains("### Collection: `messages`"));
        assert!(md.contains("| `content` | string | Message text |"));
    }

    #[test]
    fn failed_collections_show_the_error() {
        let mut broken = collection("broken");
        broken.error = Some("Connection error: read refused".into());
        let md = render_markdown(&report(vec![broken]), &FieldDescriptions::builtin());
        assert!(md.contains("> Could not be fully read: Connection error: read refused"));
        assert!(!md.contains("_No documents found_"));
    }

    #[test]
    fn field_names_cannot_break_the_table() {
        let mut odd = collection("odd");
        odd.sampled = 1;
        odd.fields.entry("a|b`c".into()).or_default().record(&json!(1), 2);
        let md = render_markdown(&report(vec![odd]), &FieldDescriptions::builtin());

        assert!(md.contains(&format!("| `a\\|b'c` | number | {} |", CUSTOM_FIELD)));
        assert!(md.contains("- `a\\|b'c`: `1`"));
    }
}
