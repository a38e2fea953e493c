//! Common parsing utilities
//!
//! Keyword helpers for the contextual keywords of the catalog syntax
//! (`base`, `optional`), which are plain identifiers to `syn`.

use syn::{parse::ParseStream, Ident};

/// Check if the next identifier is any of the given keywords
pub fn peek_any_keyword(input: ParseStream, keywords: &[&str]) -> bool {
    if input.peek(Ident) {
        let fork = input.fork();
        if let Ok(ident) = fork.parse::<Ident>() {
            let name = ident.to_string();
            return keywords.contains(&name.as_str());
        }
    }
    false
}
