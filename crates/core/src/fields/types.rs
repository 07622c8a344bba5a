//! Types describing the search fields the site understands.

use serde::Serialize;

/// Value type accepted by a typed input field.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Text,
    Int,
}

/// How a select field's option is placed in the query.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectKeying {
    /// The option is a numeric foreign key into the select list (`lang_id:2`).
    /// Rendered only when it coerces to a positive integer.
    Identifier,
    /// The raw label is placed in the query (`category:books`).
    /// Rendered whenever the option is truthy.
    Label,
}

/// A field whose values come from a list on the advanced search form.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SelectSpec {
    /// Name of the enumerated list (`categories`, `languages`, ...).
    pub list: &'static str,
    /// Key written into the query (`lang_id` for `language`).
    pub key: &'static str,
    pub keying: SelectKeying,
    pub value_type: ValueType,
}

/// What kind of search refinement a field is.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// A single quoted phrase (`exact`).
    FreeText,
    /// A list of words (`or`, `without`).
    MultiTerm,
    /// A scalar `field:value` filter.
    TypedInput { value_type: ValueType },
    /// A boolean filter rendered as `field:1`.
    Switch,
    /// A filter validated against an enumerated list.
    Select(SelectSpec),
    /// Only usable as a sort target.
    SortOnly,
}

/// Metadata for one search field.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Help text for the command line. `None` for fields that are sort targets only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    /// Short command-line flag, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Wire-level sort key (`files` sorts by `files_count`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<&'static str>,
}

impl FieldSpec {
    pub(crate) const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            description: None,
            short: None,
            sort_key: None,
        }
    }

    pub(crate) const fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub(crate) const fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub(crate) const fn sort(mut self, key: &'static str) -> Self {
        self.sort_key = Some(key);
        self
    }

    pub fn select(&self) -> Option<&SelectSpec> {
        match &self.kind {
            FieldKind::Select(spec) => Some(spec),
            _ => None,
        }
    }
}

/// A borrowed view of a select field, as returned by `FieldRegistry::selects`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectField {
    pub name: &'static str,
    pub spec: SelectSpec,
}
