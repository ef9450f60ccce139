use crate::entities::DetectionConfig;

/// Levenshtein edit distance, computed over Unicode scalar values.
pub(crate) fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single rolling row of the DP matrix.
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// `1 - distance / max(len)`, in [0, 1]. Empty input on either side counts as
/// no similarity at all.
pub(crate) fn string_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let longest = a.chars().count().max(b.chars().count());
    let distance = levenshtein_distance(a, b);
    (longest - distance) as f64 / longest as f64
}

/// `1 - |a - b| / max(a, b)`, in [0, 1] for positive amounts.
pub(crate) fn amount_similarity(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max <= 0.0 {
        return if a == b { 1.0 } else { 0.0 };
    }
    1.0 - (a - b).abs() / max
}

pub(crate) struct SimilarityInput<'a> {
    pub(crate) amount: f64,
    pub(crate) description: &'a str,
    pub(crate) vendor: &'a str,
}

/// Weighted composite of amount, description and vendor closeness.
pub(crate) fn transaction_similarity(
    a: &SimilarityInput<'_>,
    b: &SimilarityInput<'_>,
    config: &DetectionConfig,
) -> f64 {
    config.amount_weight * amount_similarity(a.amount, b.amount)
        + config.description_weight * string_similarity(a.description, b.description)
        + config.vendor_weight * string_similarity(a.vendor, b.vendor)
}
