use clap::Parser;

const EXAMPLES: &str = "\
Examples:
  price-probe https://www.amazon.fr/dp/B0DCBB2YTR
  price-probe \"https://www.amazon.fr/dp/B0DCBB2YTR?th=1\"
  price-probe --url https://www.amazon.com/dp/B08N5WRWNW";

#[derive(Parser, Debug)]
#[command(
    name = "price-probe",
    version,
    about = "Check the current price and discount of an Amazon product page",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Product page URL
    pub url: Option<String>,

    /// Product page URL (alternative to the positional argument)
    #[arg(long = "url", value_name = "URL")]
    pub url_flag: Option<String>,

    /// Trace every price element and selector attempt
    #[arg(long)]
    pub debug: bool,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Fetch the raw HTML over HTTP instead of rendering it in Chrome
    #[arg(long)]
    pub no_browser: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Currency assumed when the price text has no marker: EUR, USD, GBP (default: EUR)
    #[arg(long)]
    pub currency: Option<String>,

    /// Wait after page load in milliseconds (default: 3000)
    #[arg(long)]
    pub settle: Option<u64>,

    /// Wait per current-price selector in milliseconds (default: 5000)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Cli {
    /// The positional URL, else `--url`.
    pub fn target_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.url_flag.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_url_is_accepted() {
        let cli = Cli::try_parse_from(["price-probe", "https://www.amazon.fr/dp/B0DCBB2YTR"])
            .unwrap();
        assert_eq!(cli.target_url(), Some("https://www.amazon.fr/dp/B0DCBB2YTR"));
        assert!(!cli.debug);
    }

    #[test]
    fn flag_url_is_accepted() {
        let cli = Cli::try_parse_from([
            "price-probe",
            "--url",
            "https://www.amazon.com/dp/B08N5WRWNW",
            "--debug",
        ])
        .unwrap();
        assert_eq!(cli.target_url(), Some("https://www.amazon.com/dp/B08N5WRWNW"));
        assert!(cli.debug);
    }

    #[test]
    fn positional_wins_over_flag() {
        let cli = Cli::try_parse_from([
            "price-probe",
            "https://www.amazon.fr/dp/AAAAAAAAAA",
            "--url",
            "https://www.amazon.fr/dp/BBBBBBBBBB",
        ])
        .unwrap();
        assert_eq!(cli.target_url(), Some("https://www.amazon.fr/dp/AAAAAAAAAA"));
    }

    #[test]
    fn missing_url_parses_but_resolves_to_none() {
        let cli = Cli::try_parse_from(["price-probe", "--json"]).unwrap();
        assert_eq!(cli.target_url(), None);
    }
}
