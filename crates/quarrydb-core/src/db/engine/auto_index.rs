use crate::config::AutoIndexConfig;

/// Whether a query that read `documents_read` documents to return
/// `result_size` of them is expensive enough to deserve an index.
///
/// Small collections are never indexed. Otherwise an index pays off once
/// the scan read more documents than an index lookup per result would cost.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn should_create_index(
    config: &AutoIndexConfig,
    documents_read: usize,
    result_size: usize,
) -> bool {
    if !config.enabled || documents_read < config.min_collection_size {
        return false;
    }

    documents_read as f64 > config.relative_index_read_cost_per_document * result_size as f64
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> AutoIndexConfig {
        AutoIndexConfig {
            enabled: true,
            ..AutoIndexConfig::default()
        }
    }

    #[test]
    fn disabled_config_never_creates() {
        assert!(!should_create_index(&AutoIndexConfig::default(), 10_000, 1));
    }

    #[test]
    fn small_collections_are_skipped() {
        assert!(!should_create_index(&enabled(), 99, 0));
        assert!(should_create_index(&enabled(), 100, 0));
    }

    #[test]
    fn selective_queries_get_an_index() {
        // default cost 2.0: 100 reads beat 49 lookups, not 50
        assert!(should_create_index(&enabled(), 100, 49));
        assert!(!should_create_index(&enabled(), 100, 50));
    }
}
