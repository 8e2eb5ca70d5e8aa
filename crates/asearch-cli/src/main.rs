use clap::Parser;

use asearch_core::{Country, MalformedItemPolicy, ProductRecord};
use asearch_scraper::{SearchClient, SearchConfig};

#[derive(Debug, Parser)]
#[command(name = "asearch")]
#[command(about = "Concurrent product search scraper")]
struct Cli {
    /// Search query.
    query: String,

    /// Country site to search (CA or US).
    #[arg(long, default_value = "CA")]
    country: String,

    /// Print records as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Skip malformed result elements instead of failing the whole search.
    #[arg(long)]
    skip_malformed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let country: Country = cli.country.parse()?;

    let policy = if cli.skip_malformed {
        MalformedItemPolicy::Skip
    } else {
        MalformedItemPolicy::Abort
    };
    let client = SearchClient::new(SearchConfig {
        malformed_item_policy: policy,
        ..SearchConfig::default()
    })?;

    let records = client.search(&cli.query, country).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_table(&records);
    }

    Ok(())
}

fn print_table(records: &[ProductRecord]) {
    println!("{} results", records.len());
    for record in records {
        let price = record
            .price
            .map_or_else(|| "-".to_owned(), |p| format!("${p}"));
        let rating = record
            .rating
            .map_or_else(|| "-".to_owned(), |r| format!("{r:.1}"));
        let reviews = record
            .review_count
            .map_or_else(|| "-".to_owned(), |n| n.to_string());
        println!(
            "{:<12} {:>10} {:>5} {:>9}  {}",
            record.asin,
            price,
            rating,
            reviews,
            truncate(&record.description, 80)
        );
    }
}

fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let cut = truncate(s, 2);
        assert!(cut.len() <= 2);
        assert!(s.starts_with(cut));
    }

    #[test]
    fn truncate_passes_short_strings_through() {
        assert_eq!(truncate("short", 80), "short");
    }
}
