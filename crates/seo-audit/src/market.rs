//! Market code helpers
//!
//! Markets arrive as country codes (`US`) or locales (`en-GB`, `de_DE`).
//! Providers need a language hint and, for the data provider, a numeric
//! location code.

/// (country, language, location code, display name)
const MARKETS: &[(&str, &str, u32, &str)] = &[
    ("US", "en", 2840, "United States"),
    ("GB", "en", 2826, "United Kingdom"),
    ("UK", "en", 2826, "United Kingdom"),
    ("CA", "en", 2124, "Canada"),
    ("AU", "en", 2036, "Australia"),
    ("IE", "en", 2372, "Ireland"),
    ("IN", "en", 2356, "India"),
    ("DE", "de", 2276, "Germany"),
    ("AT", "de", 2040, "Austria"),
    ("CH", "de", 2756, "Switzerland"),
    ("FR", "fr", 2250, "France"),
    ("BE", "fr", 2056, "Belgium"),
    ("ES", "es", 2724, "Spain"),
    ("MX", "es", 2484, "Mexico"),
    ("IT", "it", 2380, "Italy"),
    ("NL", "nl", 2528, "Netherlands"),
    ("PT", "pt", 2620, "Portugal"),
    ("BR", "pt", 2076, "Brazil"),
    ("PL", "pl", 2616, "Poland"),
    ("SE", "sv", 2752, "Sweden"),
    ("JP", "ja", 2392, "Japan"),
];

const DEFAULT_LANGUAGE: &str = "en";

/// Split `en-GB` / `de_DE` / `US` into (language part, country part)
fn split_locale(market: &str) -> (Option<String>, String) {
    let market = market.trim();
    match market.split_once(['-', '_']) {
        Some((lang, country)) => (
            Some(lang.to_ascii_lowercase()),
            country.to_ascii_uppercase(),
        ),
        None => (None, market.to_ascii_uppercase()),
    }
}

fn lookup(country: &str) -> Option<&'static (&'static str, &'static str, u32, &'static str)> {
    MARKETS.iter().find(|(code, ..)| *code == country)
}

/// Language hint for a market. Explicit locale languages win; unknown
/// countries default to English.
pub fn language_for_market(market: &str) -> String {
    let (lang, country) = split_locale(market);
    if let Some(lang) = lang.filter(|l| l.len() == 2 && l.chars().all(|c| c.is_ascii_alphabetic()))
    {
        return lang;
    }
    lookup(&country).map_or_else(|| DEFAULT_LANGUAGE.to_string(), |(_, lang, ..)| (*lang).to_string())
}

/// Numeric location code for the data provider, if the market is known
pub fn location_code(market: &str) -> Option<u32> {
    let (_, country) = split_locale(market);
    lookup(&country).map(|(_, _, code, _)| *code)
}

/// Human-readable market name, falling back to the code itself
pub fn display_name(market: &str) -> String {
    let (_, country) = split_locale(market);
    lookup(&country).map_or_else(|| market.trim().to_string(), |(.., name)| (*name).to_string())
}
