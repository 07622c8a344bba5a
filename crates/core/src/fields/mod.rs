//! Declarative metadata for the site's search fields.
//!
//! The registry is a fixed, ordered table. Its order is load-bearing: the
//! query builder walks it to render filters, so two requests with the same
//! options always render the same query text.

mod types;

pub use types::*;

/// Option name selecting the sort column. Handled by the query builder, not the registry.
pub const SORT_OPTION: &str = "sort";
/// Option switching the sort order to ascending.
pub const ASC_OPTION: &str = "asc";

use self::types::FieldKind::{FreeText, MultiTerm, SortOnly, Switch};

const fn input(name: &'static str, value_type: ValueType) -> FieldSpec {
    FieldSpec::new(name, FieldKind::TypedInput { value_type })
}

const fn select(
    name: &'static str,
    list: &'static str,
    key: &'static str,
    keying: SelectKeying,
    value_type: ValueType,
) -> FieldSpec {
    FieldSpec::new(
        name,
        FieldKind::Select(SelectSpec {
            list,
            key,
            keying,
            value_type,
        }),
    )
}

static STANDARD_FIELDS: [FieldSpec; 17] = [
    FieldSpec::new("exact", FreeText).describe("Exact phrase"),
    FieldSpec::new("or", MultiTerm).describe("Optional words"),
    FieldSpec::new("without", MultiTerm).describe("Without this word"),
    select("category", "categories", "category", SelectKeying::Label, ValueType::Text)
        .describe("Category")
        .short('c'),
    select("added", "times", "age", SelectKeying::Label, ValueType::Text)
        .describe("Age of the torrent")
        .short('a')
        .sort("time_add"),
    FieldSpec::new("size", SortOnly).sort("size"),
    input("user", ValueType::Text).describe("Uploader"),
    input("files", ValueType::Int)
        .describe("Number of files")
        .sort("files_count"),
    input("imdb", ValueType::Int).describe("IMDB ID"),
    input("seeds", ValueType::Int)
        .describe("Min no of seeders")
        .short('s')
        .sort("seeders"),
    FieldSpec::new("leeches", SortOnly).sort("leechers"),
    input("season", ValueType::Int).describe("Television season"),
    input("episode", ValueType::Int)
        .describe("Television episode")
        .short('e'),
    select("language", "languages", "lang_id", SelectKeying::Identifier, ValueType::Int)
        .describe("Language"),
    select("platform", "platforms", "platform_id", SelectKeying::Identifier, ValueType::Int)
        .describe("Game platform"),
    FieldSpec::new("safe", Switch).describe("Family safe filter"),
    FieldSpec::new("verified", Switch).describe("Verified torrent"),
];

static STANDARD: FieldRegistry = FieldRegistry {
    fields: &STANDARD_FIELDS,
};

/// Read-only lookup table of search fields.
#[derive(Debug, Clone, Copy)]
pub struct FieldRegistry {
    fields: &'static [FieldSpec],
}

impl FieldRegistry {
    /// The field table for the Kickass Torrents search form.
    pub fn standard() -> &'static FieldRegistry {
        &STANDARD
    }

    /// All fields in registry order.
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Look up a field by its public name. Unknown names are simply absent.
    pub fn get(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields with a typed scalar input.
    pub fn inputs(&self) -> impl Iterator<Item = (&'static str, ValueType)> + '_ {
        self.fields.iter().filter_map(|f| match f.kind {
            FieldKind::TypedInput { value_type } => Some((f.name, value_type)),
            _ => None,
        })
    }

    /// Boolean switch fields.
    pub fn checks(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Switch))
            .map(|f| f.name)
    }

    /// Fields backed by an enumerated list.
    pub fn selects(&self) -> impl Iterator<Item = SelectField> + '_ {
        self.fields.iter().filter_map(|f| {
            f.select().map(|spec| SelectField {
                name: f.name,
                spec: *spec,
            })
        })
    }

    /// Sort targets: each public name mapped to its wire key, followed by
    /// each wire key mapped to itself so either spelling is accepted.
    pub fn sorts(&self) -> Vec<(&'static str, &'static str)> {
        let named = self
            .fields
            .iter()
            .filter_map(|f| f.sort_key.map(|key| (f.name, key)));
        let wire = self
            .fields
            .iter()
            .filter_map(|f| f.sort_key)
            .filter(|key| self.get(key).is_none())
            .map(|key| (key, key));
        named.chain(wire).collect()
    }

    /// Resolve a sort target (public name or wire key) to its wire key.
    pub fn sort_key(&self, name: &str) -> Option<&'static str> {
        self.sorts()
            .into_iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Find the select field whose values come from `list`.
    pub fn select_by_list(&self, list: &str) -> Option<SelectField> {
        self.selects().find(|s| s.spec.list == list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_unique() {
        let fields = FieldRegistry::standard().fields();
        for (i, f) in fields.iter().enumerate() {
            assert!(
                fields[i + 1..].iter().all(|g| g.name != f.name),
                "duplicate field {}",
                f.name
            );
        }
    }

    #[test]
    fn test_unknown_field_is_absent() {
        let registry = FieldRegistry::standard();
        assert!(registry.get("colour").is_none());
        assert!(registry.get("sort").is_none());
        assert!(registry.get("files").is_some());
    }

    #[test]
    fn test_inputs_in_order() {
        let names: Vec<_> = FieldRegistry::standard().inputs().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec!["user", "files", "imdb", "seeds", "season", "episode"]
        );
    }

    #[test]
    fn test_checks() {
        let names: Vec<_> = FieldRegistry::standard().checks().collect();
        assert_eq!(names, vec!["safe", "verified"]);
    }

    #[test]
    fn test_selects_carry_render_key() {
        let selects: Vec<_> = FieldRegistry::standard().selects().collect();
        let keys: Vec<_> = selects.iter().map(|s| (s.name, s.spec.key)).collect();
        assert_eq!(
            keys,
            vec![
                ("category", "category"),
                ("added", "age"),
                ("language", "lang_id"),
                ("platform", "platform_id"),
            ]
        );
        assert_eq!(selects[2].spec.keying, SelectKeying::Identifier);
        assert_eq!(selects[0].spec.keying, SelectKeying::Label);
    }

    #[test]
    fn test_sorts_accept_name_and_wire_key() {
        let registry = FieldRegistry::standard();
        assert_eq!(registry.sort_key("files"), Some("files_count"));
        assert_eq!(registry.sort_key("files_count"), Some("files_count"));
        assert_eq!(registry.sort_key("added"), Some("time_add"));
        assert_eq!(registry.sort_key("size"), Some("size"));
        assert_eq!(registry.sort_key("leechers"), Some("leechers"));
        assert_eq!(registry.sort_key("user"), None);
    }

    #[test]
    fn test_sort_only_fields_have_no_description() {
        let registry = FieldRegistry::standard();
        let size = registry.get("size").unwrap();
        assert_eq!(size.kind, FieldKind::SortOnly);
        assert!(size.description.is_none());
    }

    #[test]
    fn test_select_by_list() {
        let registry = FieldRegistry::standard();
        let times = registry.select_by_list("times").unwrap();
        assert_eq!(times.name, "added");
        assert!(registry.select_by_list("colours").is_none());
    }

    #[test]
    fn test_field_spec_serialization() {
        let registry = FieldRegistry::standard();
        let json = serde_json::to_value(registry.get("language").unwrap()).unwrap();
        assert_eq!(json["name"], "language");
        assert_eq!(json["kind"], "select");
        assert_eq!(json["key"], "lang_id");
        assert_eq!(json["list"], "languages");
    }
}
