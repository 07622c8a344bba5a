pub mod config;
pub mod engine;
pub mod fetcher;
pub mod fields;
pub mod metrics;
pub mod query;
pub mod select_list;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, OutputConfig,
    SiteConfig,
};
pub use engine::{PageSpan, SearchEngine};
pub use fetcher::{
    parse_results_page, FetchError, FetchedPage, HttpPageFetcher, PageFetcher, RecordValue,
    ResultRecord,
};
pub use fields::{
    FieldKind, FieldRegistry, FieldSpec, SelectField, SelectKeying, ValueType, ASC_OPTION,
    SORT_OPTION,
};
pub use metrics::{register_metrics, render_metrics};
pub use query::{OptionValue, QueryError, SearchOptions, SearchRequest, SearchTerms};
pub use select_list::{
    parse_select_list, SelectList, SelectListClient, SelectListError, SelectListSource,
};
pub use store::{PageStore, SearchFailure};
