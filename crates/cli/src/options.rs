//! Command-line arguments and their translation into search options.
//!
//! Arguments for search fields and select lists are generated from the
//! field registry; only the options that are not fields are declared here.

use clap::{
    value_parser, Arg, ArgAction, ArgMatches, Command, CommandFactory, FromArgMatches, Parser,
};
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::path::PathBuf;

use kat_core::{FieldKind, FieldRegistry, FieldSpec, ValueType, ASC_OPTION, SORT_OPTION};

#[derive(Parser, Debug, Default)]
#[command(name = "kat")]
#[command(version, about = "Search Kickass Torrents from the command line")]
pub struct Cli {
    /// Search terms
    pub query: Vec<String>,

    /// Sort field
    #[arg(short = 't', long, value_parser = parse_sort)]
    pub sort: Option<String>,
    /// Ascending sort order (descending is default)
    #[arg(long)]
    pub asc: bool,

    /// Directory to save torrent files to
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Print page fetch metrics on exit
    #[arg(long)]
    pub metrics: bool,

    /// Values of the registry field arguments that were given.
    #[arg(skip)]
    fields: Map<String, Value>,

    /// Select lists asked for with the list switches, in registry order.
    #[arg(skip)]
    lists: Vec<&'static str>,
}

/// How a field's value is taken from the command line.
enum ArgShape {
    Flag,
    Words,
    Int,
    Text,
}

impl ArgShape {
    fn of(kind: &FieldKind) -> Option<Self> {
        let scalar = |value_type: ValueType| match value_type {
            ValueType::Int => ArgShape::Int,
            ValueType::Text => ArgShape::Text,
        };
        Some(match kind {
            FieldKind::Switch => ArgShape::Flag,
            FieldKind::MultiTerm => ArgShape::Words,
            FieldKind::FreeText => ArgShape::Text,
            FieldKind::TypedInput { value_type } => scalar(*value_type),
            FieldKind::Select(spec) => scalar(spec.value_type),
            FieldKind::SortOnly => return None,
        })
    }
}

fn field_arg(field: &FieldSpec) -> Option<Arg> {
    let shape = ArgShape::of(&field.kind)?;

    let mut arg = Arg::new(field.name).long(field.name);
    if let Some(help) = field.description {
        arg = arg.help(help);
    }
    if let Some(short) = field.short {
        arg = arg.short(short);
    }

    Some(match shape {
        ArgShape::Flag => arg.action(ArgAction::SetTrue),
        ArgShape::Words => arg.num_args(1..).action(ArgAction::Append),
        ArgShape::Int => arg.value_parser(value_parser!(u64)),
        ArgShape::Text => arg,
    })
}

fn list_arg(list: &'static str) -> Arg {
    Arg::new(list)
        .long(list)
        .help(format!("List available {list}"))
        .action(ArgAction::SetTrue)
}

fn field_values(matches: &ArgMatches) -> Map<String, Value> {
    let mut values = Map::new();

    for field in FieldRegistry::standard().fields() {
        let Some(shape) = ArgShape::of(&field.kind) else {
            continue;
        };
        let value = match shape {
            ArgShape::Flag => matches.get_flag(field.name).then_some(Value::Bool(true)),
            ArgShape::Words => matches
                .get_many::<String>(field.name)
                .map(|words| Value::from(words.cloned().collect::<Vec<_>>())),
            ArgShape::Int => matches.get_one::<u64>(field.name).map(|n| Value::from(*n)),
            ArgShape::Text => matches
                .get_one::<String>(field.name)
                .map(|s| Value::from(s.as_str())),
        };
        if let Some(value) = value {
            values.insert(field.name.to_string(), value);
        }
    }

    values
}

fn parse_sort(value: &str) -> Result<String, String> {
    let registry = FieldRegistry::standard();
    match registry.sort_key(value) {
        Some(_) => Ok(value.to_string()),
        None => Err(format!("expected one of: {}", sort_names().join(", "))),
    }
}

fn sort_names() -> Vec<&'static str> {
    FieldRegistry::standard()
        .fields()
        .iter()
        .filter(|f| f.sort_key.is_some())
        .map(|f| f.name)
        .collect()
}

impl Cli {
    /// The full command: the declared options plus one argument per search
    /// field and one switch per select list.
    pub fn command_with_fields() -> Command {
        let registry = FieldRegistry::standard();
        let sort_help = format!("Sort field ({})", sort_names().join(", "));

        let mut command = Cli::command().mut_arg("sort", |arg| arg.help(sort_help));
        for arg in registry.fields().iter().filter_map(field_arg) {
            command = command.arg(arg);
        }
        for select in registry.selects() {
            command = command.arg(list_arg(select.spec.list));
        }
        command
    }

    /// Parse the process arguments, exiting with clap's message on error.
    pub fn parse_args() -> Self {
        Self::try_parse_args_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse_args_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command_with_fields().try_get_matches_from(args)?;
        let mut cli = Cli::from_arg_matches(&matches)?;
        cli.fields = field_values(&matches);
        cli.lists = FieldRegistry::standard()
            .selects()
            .map(|select| select.spec.list)
            .filter(|list| matches.get_flag(list))
            .collect();
        Ok(cli)
    }

    /// Search terms as a JSON value for `SearchEngine::set_terms`.
    pub fn terms(&self) -> Value {
        Value::from(self.query.clone())
    }

    /// Search options as a JSON map for `SearchEngine::set_options`.
    /// Unset arguments are left out.
    pub fn options(&self) -> Value {
        let mut map = self.fields.clone();
        if let Some(sort) = &self.sort {
            map.insert(SORT_OPTION.to_string(), Value::from(sort.as_str()));
        }
        if self.asc {
            map.insert(ASC_OPTION.to_string(), Value::Bool(true));
        }
        Value::Object(map)
    }

    /// Select lists asked for with the list switches, in registry order.
    pub fn requested_lists(&self) -> &[&'static str] {
        &self.lists
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_args_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn test_command_is_consistent() {
        Cli::command_with_fields().debug_assert();
    }

    #[test]
    fn test_parse_query_and_options() {
        let cli = parse(&[
            "kat", "ubuntu", "iso", "-c", "applications", "--files", "2", "--safe", "--or",
            "desktop", "server",
        ]);

        assert_eq!(cli.terms(), json!(["ubuntu", "iso"]));
        assert_eq!(
            cli.options(),
            json!({
                "category": "applications",
                "files": 2,
                "or": ["desktop", "server"],
                "safe": true
            })
        );
    }

    #[test]
    fn test_unset_arguments_are_left_out() {
        let cli = parse(&["kat"]);
        assert_eq!(cli.options(), json!({}));
        assert!(cli.requested_lists().is_empty());
    }

    #[test]
    fn test_field_arguments_follow_registry() {
        let mut command = Cli::command_with_fields();
        let help = command.render_help().to_string();

        for field in FieldRegistry::standard().fields() {
            match field.description {
                Some(description) => assert!(help.contains(description), "{}", field.name),
                None => assert!(!help.contains(&format!("--{} ", field.name))),
            }
        }
        assert!(help.contains("Sort field (added, size, files, seeds, leeches)"));
    }

    #[test]
    fn test_short_flags_come_from_registry() {
        let cli = parse(&["kat", "-s", "10", "-e", "3", "-a", "week"]);
        assert_eq!(
            cli.options(),
            json!({"seeds": 10, "episode": 3, "added": "week"})
        );
    }

    #[test]
    fn test_integer_fields_reject_text() {
        assert!(Cli::try_parse_args_from(["kat", "--files", "many"]).is_err());
        assert!(Cli::try_parse_args_from(["kat", "--language", "2"]).is_ok());
    }

    #[test]
    fn test_sort_only_fields_have_no_argument() {
        assert!(Cli::try_parse_args_from(["kat", "--leeches", "2"]).is_err());
    }

    #[test]
    fn test_sort_accepts_names_and_wire_keys() {
        let cli = parse(&["kat", "-t", "seeds", "--asc"]);
        assert_eq!(cli.options(), json!({"sort": "seeds", "asc": true}));

        assert!(Cli::try_parse_args_from(["kat", "--sort", "files_count"]).is_ok());
        assert!(Cli::try_parse_args_from(["kat", "--sort", "colour"]).is_err());
    }

    #[test]
    fn test_requested_lists_follow_registry_order() {
        let cli = parse(&["kat", "--platforms", "--categories"]);
        assert_eq!(cli.requested_lists(), ["categories", "platforms"]);
    }
}
