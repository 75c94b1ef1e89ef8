use std::collections::HashSet;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::NeighborhoodRecord;

/// Header/legend words of the source table. Rows still carrying these
/// slipped past the tbody boundary and are dropped.
const HEADER_NEIGHBORHOOD: &str = "Mahalle";
const HEADER_DISTRICT: &str = "İlçe";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

lazy_static! {
    // First two <td> cells of a row. (?s) so rows spanning lines match.
    static ref ROW_RE: Regex =
        Regex::new(r"(?s)<tr[^>]*>.*?<td[^>]*>([^<]+)</td>.*?<td[^>]*>([^<]+)</td>")
            .expect("invalid row regex");
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("table #{0} not found in page; the source layout may have changed")]
    StructureNotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fetch the source page. One attempt, no retries; this runs manually.
pub async fn fetch(url: &str) -> Result<String, ScrapeError> {
    let resp = reqwest::Client::new()
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ScrapeError::Status(status));
    }

    Ok(resp.text().await?)
}

/// Extract (neighborhood, district) pairs from the identified table's
/// tbody, in document order. Rows with an empty cell or a leftover
/// header word are dropped. A missing table/tbody is a distinct error
/// so callers can tell "layout changed" from "no data".
pub fn extract(html: &str, table_id: &str) -> Result<Vec<NeighborhoodRecord>, ScrapeError> {
    let table_re = Regex::new(&format!(
        r#"(?s)<table[^>]*id="{}"[^>]*>.*?<tbody>(.*?)</tbody>"#,
        regex::escape(table_id)
    ))
    .expect("invalid table regex");

    let tbody = match table_re.captures(html) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => return Err(ScrapeError::StructureNotFound(table_id.to_string())),
    };

    let mut records = Vec::new();
    for caps in ROW_RE.captures_iter(tbody) {
        let neighborhood = caps.get(1).map_or("", |m| m.as_str()).trim();
        let district = caps.get(2).map_or("", |m| m.as_str()).trim();

        if neighborhood.is_empty()
            || district.is_empty()
            || neighborhood.contains(HEADER_NEIGHBORHOOD)
            || district.contains(HEADER_DISTRICT)
        {
            continue;
        }

        records.push(NeighborhoodRecord {
            neighborhood: neighborhood.to_string(),
            district: district.to_string(),
        });
    }

    Ok(records)
}

/// Write the artifact: a pretty-printed UTF-8 JSON array, replaced
/// wholesale. Nothing is written on any earlier failure.
pub fn write_artifact(records: &[NeighborhoodRecord], path: &Path) -> Result<(), ScrapeError> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Full build run: fetch, extract, write, preview.
pub async fn run(url: &str, table_id: &str, output: &Path) -> Result<usize, ScrapeError> {
    log::info!("fetching {}", url);
    let html = fetch(url).await?;

    let records = extract(&html, table_id)?;

    write_artifact(&records, output)?;

    let districts: HashSet<&str> = records.iter().map(|r| r.district.as_str()).collect();
    log::info!(
        "wrote {} neighborhoods across {} districts to {}",
        records.len(),
        districts.len(),
        output.display()
    );
    for (i, r) in records.iter().take(5).enumerate() {
        log::info!("{}. {} - {}", i + 1, r.neighborhood, r.district);
    }

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
        <table id="data-table" class="wide">
          <thead><tr><th>Mahalle</th><th>İlçe</th></tr></thead>
          <tbody>
            <tr><td>Mahalle</td><td>İlçe</td></tr>
            <tr>
              <td>Acıbadem</td>
              <td>Üsküdar</td>
              <td>12345</td>
            </tr>
            <tr><td class="c">Moda</td><td>Kadıköy</td></tr>
            <tr><td> Caferağa </td><td>Kadıköy</td></tr>
          </tbody>
        </table>
        </body></html>"#;

    #[test]
    fn extracts_rows_in_source_order_and_drops_header_row() {
        let records = extract(FIXTURE, "data-table").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].neighborhood, "Acıbadem");
        assert_eq!(records[0].district, "Üsküdar");
        assert_eq!(records[1].neighborhood, "Moda");
        assert_eq!(records[2].neighborhood, "Caferağa");
    }

    #[test]
    fn missing_table_is_a_structural_failure() {
        let err = extract("<html><table id=\"other\"></table></html>", "data-table")
            .unwrap_err();
        assert!(matches!(err, ScrapeError::StructureNotFound(id) if id == "data-table"));
    }

    #[test]
    fn rows_with_empty_cells_are_dropped() {
        let html = r#"
            <table id="data-table"><tbody>
              <tr><td>   </td><td>Kadıköy</td></tr>
              <tr><td>Moda</td><td>Kadıköy</td></tr>
            </tbody></table>"#;
        let records = extract(html, "data-table").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].neighborhood, "Moda");
    }

    #[test]
    fn table_id_is_escaped_in_pattern() {
        // An id with regex metacharacters must not panic or mismatch.
        let err = extract("<p>no tables here</p>", "data.table[1]").unwrap_err();
        assert!(matches!(err, ScrapeError::StructureNotFound(_)));
    }

    #[test]
    fn artifact_is_pretty_printed_json() {
        let records = vec![NeighborhoodRecord {
            neighborhood: "Moda".to_string(),
            district: "Kadıköy".to_string(),
        }];
        let dir = std::env::temp_dir().join("kuryesite-test-artifact");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("neighborhoods.json");

        write_artifact(&records, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("  \"neighborhood\": \"Moda\""));

        let parsed: Vec<NeighborhoodRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, records);
    }
}
