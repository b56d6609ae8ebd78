use anyhow::Context;

/// Undecoded feed content: the header line plus one joined string per data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeed {
    pub header: String,
    pub rows: Vec<String>,
}

impl RawFeed {
    pub fn new(header: impl Into<String>, rows: Vec<String>) -> Self {
        Self {
            header: header.into(),
            rows,
        }
    }

    /// Decode the published CSV.
    ///
    /// The first line is the header (it carries the publication date). The first
    /// record after it holds the column titles and is skipped. Rows are
    /// `;`-separated, so the comma-delimited reader normally sees one field per
    /// record; a price written with a `,` decimal separator is split in two and
    /// rejoined here.
    pub fn from_csv(text: &str) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let header: String = reader
            .headers()
            .context("read feed header failed")?
            .iter()
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("read feed record {} failed", idx + 1))?;
            if idx == 0 {
                continue;
            }
            let row = record.iter().collect::<Vec<_>>().join(",");
            if row.trim().is_empty() {
                continue;
            }
            rows.push(row);
        }

        Ok(Self { header, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_column_titles_and_rejoins_decimal_comma() {
        let text = "Aggiornamento 2026-10-18\n\
                    Regione;Tipo;Erogazione;Prezzo medio\n\
                    Lazio;Benzina;self;1,812\n\
                    \n\
                    Molise;Gasolio;servito;1.905\n";

        let feed = RawFeed::from_csv(text).unwrap();
        assert_eq!(feed.header, "Aggiornamento 2026-10-18");
        assert_eq!(
            feed.rows,
            vec![
                "Lazio;Benzina;self;1,812".to_string(),
                "Molise;Gasolio;servito;1.905".to_string(),
            ]
        );
    }

    #[test]
    fn header_only_feed_has_no_rows() {
        let feed = RawFeed::from_csv("Aggiornamento 2026-10-18\n").unwrap();
        assert!(feed.rows.is_empty());
    }
}
