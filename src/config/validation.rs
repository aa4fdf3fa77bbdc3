//! Unknown-key detection for studio config files.
//!
//! The raw TOML is walked as a `toml::Value` tree and every dotted key path is compared with
//! the known field set. Unknown keys produce warnings with a "did you mean?" suggestion;
//! they never fail the load.

use std::collections::HashSet;

/// A non-fatal config warning.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

/// Every valid dotted key path of `StudioConfig`.
///
/// Kept in step with the section structs in `studio_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    [
        "statistics",
        "statistics.min_paired_samples",
        "statistics.min_group_size",
        "statistics.classification_cardinality",
        "importance",
        "importance.min_rows",
        "importance.n_trees",
        "importance.seed",
        "importance.max_depth",
        "importance.min_samples_split",
        "ranking",
        "ranking.significance_weight",
        "ranking.effect_size_weight",
        "ranking.correlation_weight",
        "ranking.importance_weight",
        "ranking.null_p_value_significance",
        "execution",
        "execution.test_fraction",
        "execution.split_seed",
        "execution.classification_cardinality",
        "execution.groupby_limit",
        "execution.logistic_max_iter",
        "execution.logistic_learning_rate",
        "execution.logistic_l2",
        "session",
        "session.max_target_candidates",
    ]
    .into_iter()
    .collect()
}

/// Collects dotted key paths of every table entry.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3. Ties resolve alphabetically.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();
    candidates
        .into_iter()
        .map(|k| (k, edit_distance(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| k.to_string())
}

/// Warnings for every unknown key in a raw TOML document.
///
/// Parse errors yield no warnings; serde reports them on the real load.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_pass() {
        let raw = "[ranking]\nsignificance_weight = 0.35\n";
        assert!(validate_unknown_keys(raw).is_empty());
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let raw = "[importance]\nn_tress = 50\n";
        let warnings = validate_unknown_keys(raw);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "importance.n_tress");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("importance.n_trees"));
    }

    #[test]
    fn test_unrelated_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("[completely_different]\nvalue = 1\n");
        assert!(warnings.iter().all(|w| w.suggestion.is_none()));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("seed", "seed"), 0);
        assert_eq!(edit_distance("seed", "sed"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
    }
}
