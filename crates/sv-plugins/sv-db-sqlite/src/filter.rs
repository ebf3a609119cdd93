//! Translates `sv_core::Predicate` into a parameterized SQL condition.
//!
//! Every value goes through `push_bind`; nothing user-supplied is ever
//! spliced into the statement text. Substring search uses `instr`, so
//! search terms are always literal (no LIKE wildcards, no patterns).
//! Text fields are matched against their `*_folded` columns, lowercased in
//! Rust on write, so non-ASCII letters compare case-insensitively too.

use sqlx::{QueryBuilder, Sqlite};
use sv_core::{Predicate, TextField};

use crate::uuid_to_blob;

/// Appends the condition for `predicate`, referencing the `snippets` row as `s`.
pub(crate) fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    match predicate {
        Predicate::Any => {
            qb.push("1 = 1");
        }
        Predicate::Owner(owner) => {
            qb.push("s.owner_id = ").push_bind(uuid_to_blob(*owner));
        }
        Predicate::IsPublic(flag) => {
            qb.push("s.is_public = ").push_bind(*flag);
        }
        Predicate::HasTag(tag) => {
            qb.push("EXISTS (SELECT 1 FROM json_each(s.tags) WHERE json_each.value = ")
                .push_bind(tag.clone())
                .push(")");
        }
        Predicate::Language(language) => {
            qb.push("s.code_language = ").push_bind(language.clone());
        }
        Predicate::Contains(field, needle) => push_contains(qb, *field, needle),
        Predicate::CreatedFrom(from) => {
            qb.push("s.created_at >= ").push_bind(from.timestamp_millis());
        }
        Predicate::CreatedUntil(to) => {
            qb.push("s.created_at <= ").push_bind(to.timestamp_millis());
        }
        Predicate::FavoritedBy(user) => {
            qb.push("EXISTS (SELECT 1 FROM favorites f WHERE f.snippet_id = s.id AND f.user_id = ")
                .push_bind(uuid_to_blob(*user))
                .push(")");
        }
        Predicate::And(clauses) => push_group(qb, clauses, " AND ", "1 = 1"),
        Predicate::Or(clauses) => push_group(qb, clauses, " OR ", "1 = 0"),
    }
}

fn push_group(qb: &mut QueryBuilder<'_, Sqlite>, clauses: &[Predicate], joiner: &str, empty: &str) {
    if clauses.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            qb.push(joiner);
        }
        push_predicate(qb, clause);
    }
    qb.push(")");
}

fn push_contains(qb: &mut QueryBuilder<'_, Sqlite>, field: TextField, needle: &str) {
    let column = match field {
        TextField::Title => "s.title_folded",
        TextField::Description => "s.description_folded",
        TextField::Code => "s.code_folded",
        // Tags are stored lowercased already.
        TextField::Tags => {
            qb.push("EXISTS (SELECT 1 FROM json_each(s.tags) WHERE instr(json_each.value, ")
                .push_bind(needle.to_string())
                .push(") > 0)");
            return;
        }
    };
    qb.push("instr(")
        .push(column)
        .push(", ")
        .push_bind(needle.to_string())
        .push(") > 0");
}
