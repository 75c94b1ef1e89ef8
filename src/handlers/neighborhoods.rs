use std::sync::Arc;

use axum::extract::{Query, State};

use super::{json, ApiResp, Ctx, Result};
use crate::autocomplete::NeighborhoodSet;

/// Query params for the autocomplete endpoint.
#[derive(Debug, serde::Deserialize, Default)]
pub struct FilterQuery {
    #[serde(default)]
    pub q: String,
    /// Optional display cap. 0 = untruncated (the filter contract).
    #[serde(default)]
    pub limit: usize,
}

/// One dropdown suggestion: the record fields plus the canonical text
/// the field takes when the suggestion is picked.
#[derive(Debug, serde::Serialize)]
pub struct Suggestion {
    pub neighborhood: String,
    pub district: String,
    pub label: String,
}

pub(crate) fn suggest(set: &NeighborhoodSet, q: &str, limit: usize) -> Vec<Suggestion> {
    let mut matches = set.filter(q);

    if limit > 0 {
        matches.truncate(limit);
    }

    matches
        .into_iter()
        .map(|r| Suggestion {
            neighborhood: r.neighborhood.clone(),
            district: r.district.clone(),
            label: r.label(),
        })
        .collect()
}

/// GET /api/neighborhoods?q= - Filter neighborhood records for the
/// form's autocomplete. An empty query returns the full set.
pub async fn filter(
    State(ctx): State<Arc<Ctx>>,
    Query(params): Query<FilterQuery>,
) -> Result<ApiResp<Vec<Suggestion>>> {
    Ok(json(suggest(&ctx.neighborhoods, &params.q, params.limit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NeighborhoodRecord;

    fn set() -> NeighborhoodSet {
        NeighborhoodSet::new(vec![
            NeighborhoodRecord {
                neighborhood: "Acıbadem".into(),
                district: "Üsküdar".into(),
            },
            NeighborhoodRecord {
                neighborhood: "Moda".into(),
                district: "Kadıköy".into(),
            },
            NeighborhoodRecord {
                neighborhood: "Caferağa".into(),
                district: "Kadıköy".into(),
            },
        ])
    }

    #[test]
    fn suggestions_carry_canonical_labels() {
        let out = suggest(&set(), "moda", 0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].neighborhood, "Moda");
        assert_eq!(out[0].district, "Kadıköy");
        assert_eq!(out[0].label, "Moda Mh. - Kadıköy");
    }

    #[test]
    fn empty_query_suggests_everything() {
        let out = suggest(&set(), "", 0);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].label, "Acıbadem Mh. - Üsküdar");
    }

    #[test]
    fn limit_caps_the_suggestion_count() {
        let out = suggest(&set(), "kadıköy", 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "Moda Mh. - Kadıköy");
    }
}
