use std::path::Path;

use crate::models::portfolio::PortfolioEntry;

use super::PortfolioError;

/// Reads the portfolio CSV (`Techstack`, `Links` header columns).
pub async fn read_portfolio_csv(path: &Path) -> Result<Vec<PortfolioEntry>, PortfolioError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PortfolioError::Source(format!("{}: {e}", path.display())))?;
    parse_portfolio_csv(&bytes)
}

pub fn parse_portfolio_csv(bytes: &[u8]) -> Result<Vec<PortfolioEntry>, PortfolioError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    reader
        .deserialize::<PortfolioEntry>()
        .map(|row| row.map_err(PortfolioError::from))
        .collect()
}
