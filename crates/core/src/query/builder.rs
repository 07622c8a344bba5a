//! Renders a search request into query tokens and the site's request path.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::fields::{FieldRegistry, SelectKeying, ASC_OPTION, SORT_OPTION};

use super::{SearchOptions, SearchRequest};

/// Path listing the most recent uploads, used when there is no query text.
pub const RECENT_PATH: &str = "new";
/// Path prefix for searches.
pub const SEARCH_PATH: &str = "usearch";

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9: _-]").expect("valid pattern"));

/// Build the ordered token list for a request.
///
/// Order: terms, exact phrase, OR-group, without-terms, then inputs,
/// switches and selects in registry order.
pub fn build_tokens(request: &SearchRequest, registry: &FieldRegistry) -> Vec<String> {
    let options = &request.options;
    let mut tokens: Vec<String> = request.terms.as_slice().to_vec();

    if let Some(exact) = options.truthy("exact") {
        tokens.push(format!("\"{exact}\""));
    }

    if let Some(or) = options.truthy("or") {
        let words = or.items();
        if !words.is_empty() {
            tokens.push(words.join(" OR "));
        }
    }

    if let Some(without) = options.truthy("without") {
        tokens.extend(without.items().into_iter().map(|w| format!("-{w}")));
    }

    for (name, _) in registry.inputs() {
        if let Some(value) = options.truthy(name) {
            tokens.push(format!("{name}:{value}"));
        }
    }

    for name in registry.checks() {
        if options.truthy(name).is_some() {
            tokens.push(format!("{name}:1"));
        }
    }

    for select in registry.selects() {
        let Some(value) = options.get(select.name) else {
            continue;
        };
        let include = match select.spec.keying {
            SelectKeying::Identifier => value.to_int() > 0,
            SelectKeying::Label => value.is_truthy(),
        };
        if include {
            tokens.push(format!("{}:{}", select.spec.key, value));
        }
    }

    tokens
}

/// Join the tokens and strip everything the site's path routing can't take.
///
/// Sanitising happens once on the joined text, so a quoted exact phrase
/// loses its quotes here.
pub fn query_text(tokens: &[String]) -> String {
    UNSAFE_CHARS.replace_all(&tokens.join(" "), "").into_owned()
}

/// The sort suffix for the request, if the `sort` option names a sortable field.
pub fn sort_suffix(options: &SearchOptions, registry: &FieldRegistry) -> Option<String> {
    let target = options.get(SORT_OPTION)?.to_string();
    let key = registry.sort_key(&target)?;
    let order = if options.truthy(ASC_OPTION).is_some() {
        "asc"
    } else {
        "desc"
    };
    Some(format!("?field={key}&sorder={order}"))
}

/// Build the request path for a 0-based page.
///
/// `new/` for an empty query, otherwise `usearch/<text>/`, with the 1-based
/// page number appended for pages after the first and the sort suffix last.
/// The final empty segment keeps the trailing slash the site's routing needs.
pub fn build_path(
    tokens: &[String],
    page: usize,
    options: &SearchOptions,
    registry: &FieldRegistry,
) -> String {
    let text = query_text(tokens);
    let mut segments = if text.is_empty() {
        vec![RECENT_PATH.to_string()]
    } else {
        vec![SEARCH_PATH.to_string(), text]
    };

    if page > 0 {
        segments.push((page + 1).to_string());
    }

    segments.push(sort_suffix(options, registry).unwrap_or_default());
    segments.join("/")
}
