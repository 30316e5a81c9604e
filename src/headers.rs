//! Request Headers - Randomised browser-like header sets
//!
//! Independent of payload mutation; callers attach these to whatever
//! request carries the payload.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::BTreeMap;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Mobile/15E148 Safari/604.1",
];

const REFERERS: &[&str] = &[
    "https://www.google.com/",
    "https://www.bing.com/",
    "https://duckduckgo.com/",
    "https://search.yahoo.com/",
    "https://www.baidu.com/",
];

const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8,en-US;q=0.5",
    "en-US,en-GB;q=0.7,en;q=0.3",
];

/// Generator for browser-like request headers
pub struct HeaderGenerator;

impl HeaderGenerator {
    /// One header set: random identity headers, fixed cache headers and a
    /// single `X-Custom-<letter>` header with an 8-character value
    pub fn generate(rng: &mut impl Rng) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();

        headers.insert("User-Agent".to_string(), pick(USER_AGENTS, rng));
        headers.insert("Referer".to_string(), pick(REFERERS, rng));
        headers.insert("Accept-Language".to_string(), pick(ACCEPT_LANGUAGES, rng));
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());
        headers.insert("Pragma".to_string(), "no-cache".to_string());
        headers.insert("Connection".to_string(), "keep-alive".to_string());

        let letter = rng.gen_range(b'A'..=b'Z') as char;
        let value: String = (0..8).map(|_| rng.sample(Alphanumeric) as char).collect();
        headers.insert(format!("X-Custom-{}", letter), value);

        headers
    }
}

fn pick(options: &[&str], rng: &mut impl Rng) -> String {
    options[rng.gen_range(0..options.len())].to_string()
}
