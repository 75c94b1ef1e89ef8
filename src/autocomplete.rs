use std::sync::Arc;

use crate::models::NeighborhoodRecord;

/// Normalize a typed query for matching: lowercase, strip a trailing
/// "mh." / "mh" neighborhood marker, trim. Stripping is suffix-only so
/// the marker inside a real name is left alone.
pub fn normalize_query(q: &str) -> String {
    let q = q.to_lowercase();
    let q = q.trim();
    let q = q
        .strip_suffix("mh.")
        .or_else(|| q.strip_suffix("mh"))
        .unwrap_or(q);
    q.trim().to_string()
}

/// Immutable, in-memory set of neighborhood records loaded from the
/// scraped JSON artifact. Shared read-only across all filter sessions.
pub struct NeighborhoodSet {
    records: Vec<NeighborhoodRecord>,
}

impl NeighborhoodSet {
    pub fn new(records: Vec<NeighborhoodRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NeighborhoodRecord] {
        &self.records
    }

    /// Filter records against a raw query, in source order, untruncated.
    /// Callers needing a bounded list slice the result themselves.
    ///
    /// An empty or whitespace-only query matches everything. A query
    /// that is nothing but the "mh" marker matches nothing. Otherwise a
    /// record matches when the normalized query is a substring of its
    /// neighborhood or district, or when the raw query is a substring
    /// of "{neighborhood} mh." (so typing the marker verbatim still
    /// matches records stored without it).
    pub fn filter(&self, query: &str) -> Vec<&NeighborhoodRecord> {
        let raw = query.trim().to_lowercase();
        if raw.is_empty() {
            return self.records.iter().collect();
        }

        let norm = normalize_query(query);
        if norm.is_empty() {
            return Vec::new();
        }

        self.records
            .iter()
            .filter(|r| record_matches(r, &norm, &raw))
            .collect()
    }
}

fn record_matches(r: &NeighborhoodRecord, norm: &str, raw: &str) -> bool {
    let neighborhood = r.neighborhood.to_lowercase();
    let district = r.district.to_lowercase();
    neighborhood.contains(norm)
        || district.contains(norm)
        || format!("{} mh.", neighborhood).contains(raw)
}

/// Per-input-field autocomplete state. Two form fields (pickup and
/// dropoff) each hold their own session over the same shared set, so
/// typing or selecting in one never disturbs the other.
pub struct Session {
    set: Arc<NeighborhoodSet>,
    query: String,
    results: Vec<usize>,
}

impl Session {
    pub fn new(set: Arc<NeighborhoodSet>) -> Self {
        let results = (0..set.len()).collect();
        Self {
            set,
            query: String::new(),
            results,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Recompute results for a keystroke. Synchronous and pure over the
    /// shared set; safe to call on every input change.
    pub fn input(&mut self, query: &str) {
        self.query = query.to_string();

        let raw = query.trim().to_lowercase();
        if raw.is_empty() {
            self.results = (0..self.set.len()).collect();
            return;
        }

        let norm = normalize_query(query);
        if norm.is_empty() {
            self.results.clear();
            return;
        }

        self.results = self
            .set
            .records()
            .iter()
            .enumerate()
            .filter(|(_, r)| record_matches(r, &norm, &raw))
            .map(|(i, _)| i)
            .collect();
    }

    /// Current matches in source order.
    pub fn results(&self) -> Vec<&NeighborhoodRecord> {
        self.results
            .iter()
            .map(|&i| &self.set.records()[i])
            .collect()
    }

    /// Pick the nth current result: the query becomes the canonical
    /// "{neighborhood} Mh. - {district}" text and this session's result
    /// list collapses to empty, closing its dropdown.
    pub fn select(&mut self, n: usize) -> Option<String> {
        let idx = *self.results.get(n)?;
        let label = self.set.records()[idx].label();
        self.query = label.clone();
        self.results.clear();
        Some(label)
    }
}

/// Canonicalize free-typed field text: run it through a one-shot
/// session and, when it narrows down to exactly one record, replace it
/// with that record's canonical label. Ambiguous or unknown text is
/// passed through untouched.
pub fn canonicalize(set: &Arc<NeighborhoodSet>, text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let mut session = Session::new(set.clone());
    session.input(text);
    if session.results().len() == 1 && session.select(0).is_some() {
        return session.query().to_string();
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<NeighborhoodRecord> {
        [
            ("Acıbadem", "Üsküdar"),
            ("Moda", "Kadıköy"),
            ("Caferağa", "Kadıköy"),
            ("Moda", "Beykoz"),
        ]
        .iter()
        .map(|(n, d)| NeighborhoodRecord {
            neighborhood: n.to_string(),
            district: d.to_string(),
        })
        .collect()
    }

    fn set() -> NeighborhoodSet {
        NeighborhoodSet::new(records())
    }

    #[test]
    fn normalize_strips_trailing_marker_only() {
        assert_eq!(normalize_query("Acıbadem Mh."), "acıbadem");
        assert_eq!(normalize_query("Acıbadem mh"), "acıbadem");
        assert_eq!(normalize_query("  Moda  "), "moda");
        assert_eq!(normalize_query("mh."), "");
        assert_eq!(normalize_query("mh"), "");
    }

    #[test]
    fn empty_query_returns_full_set_in_order() {
        let s = set();
        let all = s.filter("");
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].neighborhood, "Acıbadem");
        assert_eq!(all[3].district, "Beykoz");
        assert_eq!(s.filter("   ").len(), 4);
    }

    #[test]
    fn matches_by_neighborhood_or_district_substring() {
        let s = set();
        assert_eq!(s.filter("badem").len(), 1);
        assert_eq!(s.filter("kadıköy").len(), 2);
        assert_eq!(s.filter("ÜSKÜDAR").len(), 1);
        // Duplicate neighborhood names across districts are both kept.
        assert_eq!(s.filter("moda").len(), 2);
    }

    #[test]
    fn bare_marker_matches_nothing() {
        let s = set();
        assert!(s.filter("mh").is_empty());
        assert!(s.filter("Mh.").is_empty());
    }

    #[test]
    fn suffix_form_query_matches_unsuffixed_record() {
        let s = set();
        let hits = s.filter("Acıbadem Mh.");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].district, "Üsküdar");
    }

    #[test]
    fn no_false_positives() {
        let s = set();
        for q in ["badem", "kadı", "moda mh", "caferağa"] {
            let norm = normalize_query(q);
            let raw = q.trim().to_lowercase();
            for r in s.filter(q) {
                assert!(
                    record_matches(r, &norm, &raw),
                    "{:?} must not match {:?}",
                    q,
                    r
                );
            }
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let s = set();
        let once: Vec<_> = s.filter("kadıköy").into_iter().cloned().collect();
        let again = NeighborhoodSet::new(once.clone());
        let twice: Vec<_> = again.filter("kadıköy").into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn session_starts_with_full_set() {
        let s = Session::new(Arc::new(set()));
        assert_eq!(s.results().len(), 4);
        assert_eq!(s.query(), "");
    }

    #[test]
    fn select_sets_canonical_text_and_closes_dropdown() {
        let mut s = Session::new(Arc::new(set()));
        s.input("badem");
        assert_eq!(s.results().len(), 1);

        let label = s.select(0).unwrap();
        assert_eq!(label, "Acıbadem Mh. - Üsküdar");
        assert_eq!(s.query(), "Acıbadem Mh. - Üsküdar");
        assert!(s.results().is_empty());

        // Selecting again with no results is a no-op.
        assert!(s.select(0).is_none());
    }

    #[test]
    fn sessions_are_independent() {
        let shared = Arc::new(set());
        let mut pickup = Session::new(shared.clone());
        let mut dropoff = Session::new(shared);

        pickup.input("moda");
        dropoff.input("kadıköy");
        assert_eq!(pickup.results().len(), 2);
        assert_eq!(dropoff.results().len(), 2);

        pickup.select(0).unwrap();
        assert!(pickup.results().is_empty());
        // The other field's dropdown is untouched.
        assert_eq!(dropoff.results().len(), 2);
        assert_eq!(dropoff.query(), "kadıköy");
    }

    #[test]
    fn canonicalize_resolves_unique_match() {
        let shared = Arc::new(set());
        assert_eq!(canonicalize(&shared, "acıbadem"), "Acıbadem Mh. - Üsküdar");
        assert_eq!(canonicalize(&shared, "caferağa"), "Caferağa Mh. - Kadıköy");
    }

    #[test]
    fn canonicalize_passes_through_ambiguous_or_unknown_text() {
        let shared = Arc::new(set());
        // Two Moda records, so the text stays as typed.
        assert_eq!(canonicalize(&shared, "moda"), "moda");
        assert_eq!(canonicalize(&shared, "yoktur"), "yoktur");
        assert_eq!(canonicalize(&shared, ""), "");
    }

    #[test]
    fn canonicalize_leaves_canonical_text_alone() {
        let shared = Arc::new(set());
        let label = canonicalize(&shared, "acıbadem");
        assert_eq!(canonicalize(&shared, &label), label);
    }
}
