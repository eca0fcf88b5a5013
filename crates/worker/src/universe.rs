use clap::ValueEnum;
use duallens_core::domain::metrics::TickerSymbol;

/// Companies covered by the bundled AI-initiative documents.
pub const SEED_TICKERS: &[&str] = &["GOOGL", "MSFT", "IBM", "NVDA", "AMZN"];

pub const NASDAQ_100: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "META", "GOOGL", "GOOG", "TSLA", "AVGO", "COST", "NFLX",
    "ASML", "TMUS", "AMD", "PEP", "LIN", "CSCO", "ADBE", "TXN", "QCOM", "INTU", "AMAT", "ISRG",
    "CMCSA", "BKNG", "HON", "VRTX", "ADP", "PANW", "SBUX", "GILD", "MU", "ADI", "INTC", "LRCX",
    "MELI", "REGN", "KLAC", "MDLZ", "CTAS", "SNPS", "CDNS", "PYPL", "CSX", "ORLY", "ABNB", "MAR",
    "FTNT", "MNST", "WDAY", "ROST", "PCAR", "NXPI", "KDP", "CPRT", "PAYX", "DXCM", "CHTR", "ODFL",
    "FAST", "MRVL", "AEP", "CEG", "TEAM", "VRSK", "XEL", "IDXX", "EA", "FANG", "CTSH", "GEHC",
    "EXC", "CCEP", "TTD", "ON", "BIIB", "ZS", "CSGP", "DLTR", "BKR", "ANSS", "GFS", "SIRI", "WBD",
    "ALGN", "MDB", "ENPH", "LCID", "ZM", "MRNA", "CRWD", "DDOG", "RIVN", "ILMN", "PDD", "JD",
    "BIDU", "NTES", "WBA", "IBM",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Universe {
    #[default]
    Seed,
    Nasdaq100,
}

impl Universe {
    fn symbols(self) -> &'static [&'static str] {
        match self {
            Universe::Seed => SEED_TICKERS,
            Universe::Nasdaq100 => NASDAQ_100,
        }
    }
}

/// Explicit tickers win over the named universe. Duplicates are dropped,
/// first occurrence kept.
pub fn resolve_tickers(explicit: &[String], universe: Universe) -> anyhow::Result<Vec<TickerSymbol>> {
    let raw: Vec<&str> = if explicit.is_empty() {
        universe.symbols().to_vec()
    } else {
        explicit.iter().map(String::as_str).collect()
    };

    let mut out: Vec<TickerSymbol> = Vec::with_capacity(raw.len());
    for s in raw {
        let ticker = TickerSymbol::parse(s)?;
        if !out.contains(&ticker) {
            out.push(ticker);
        }
    }
    anyhow::ensure!(!out.is_empty(), "ticker universe is empty");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_seed_list() {
        let out = resolve_tickers(&[], Universe::Seed).unwrap();
        let names: Vec<&str> = out.iter().map(TickerSymbol::as_str).collect();
        assert_eq!(names, SEED_TICKERS);
    }

    #[test]
    fn explicit_tickers_are_normalised_and_deduplicated() {
        let explicit = vec!["nvda".to_string(), "IBM".to_string(), " NVDA ".to_string()];
        let out = resolve_tickers(&explicit, Universe::Nasdaq100).unwrap();
        let names: Vec<&str> = out.iter().map(TickerSymbol::as_str).collect();
        assert_eq!(names, vec!["NVDA", "IBM"]);
    }

    #[test]
    fn invalid_ticker_is_rejected() {
        assert!(resolve_tickers(&["BAD TICKER".to_string()], Universe::Seed).is_err());
    }

    #[test]
    fn nasdaq_list_has_one_hundred_entries() {
        assert_eq!(NASDAQ_100.len(), 100);
    }
}
