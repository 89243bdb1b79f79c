//! Source reputation: classify a URL as trusted, untrusted, unknown or
//! invalid from its domain and a handful of lexical signals.
//!
//! Lists are compile-time constants. A domain matches a list entry exactly or
//! as a subdomain (`news.bbc.co.uk` matches `bbc.co.uk`).

use std::collections::HashSet;

use url::Url;

use verity_common::{normalize_hyphens, SourceAssessment, SourceStatus};

pub const TRUSTED_SCORE: f64 = 0.95;
pub const NEUTRAL_SCORE: f64 = 0.5;

const HTTPS_BONUS: f64 = 0.1;
const TRUSTED_TLD_BONUS: f64 = 0.2;
const SUSPICIOUS_TLD_PENALTY: f64 = 0.15;
const RED_FLAG_PENALTY: f64 = 0.25;

const TRUSTED_THRESHOLD: f64 = 0.75;
const UNTRUSTED_THRESHOLD: f64 = 0.4;

pub const TRUSTED_DOMAINS: &[&str] = &[
    // Wire services and international broadcasters
    "reuters.com",
    "apnews.com",
    "bloomberg.com",
    "afp.com",
    "upi.com",
    "bbc.com",
    "bbc.co.uk",
    "dw.com",
    "france24.com",
    "aljazeera.com",
    "euronews.com",
    "cbc.ca",
    "abc.net.au",
    "npr.org",
    "pbs.org",
    // US national press
    "nytimes.com",
    "wsj.com",
    "washingtonpost.com",
    "usatoday.com",
    "latimes.com",
    "chicagotribune.com",
    "bostonglobe.com",
    "cnn.com",
    "nbcnews.com",
    "cbsnews.com",
    "abcnews.go.com",
    "msnbc.com",
    "cnbc.com",
    "foxnews.com",
    "time.com",
    "newsweek.com",
    "usnews.com",
    // UK press
    "theguardian.com",
    "independent.co.uk",
    "telegraph.co.uk",
    "standard.co.uk",
    "ft.com",
    "economist.com",
    // Science and technology
    "wired.com",
    "theverge.com",
    "arstechnica.com",
    "techcrunch.com",
    "scientificamerican.com",
    "nature.com",
    "science.org",
    "spacenews.com",
    "sciencedaily.com",
    // Fact checkers
    "snopes.com",
    "politifact.com",
    "factcheck.org",
    "fullfact.org",
    // Institutions
    "who.int",
    "un.org",
    "reliefweb.int",
    "mit.edu",
    "harvard.edu",
    "stanford.edu",
    "rmit.edu.au",
    // Regional
    "kathmandupost.com",
    "kathmandugazette.com",
    "risingnepal.org.np",
    "nepalnews.com",
    "khabarhub.com",
    "himalayadiary.com",
    "setopati.com",
    "tass.com",
];

pub const UNTRUSTED_DOMAINS: &[&str] = &[
    "theonion.com",
    "onion.com",
    "babylonbee.com",
    "clickbait-central.com",
    "satire-world.com",
    "dailybuzz.live",
    "infowars.com",
    "naturalnews.com",
    "breitbart.com",
    "gatewaypundit.com",
    "zerohedge.com",
    "sputniknews.com",
    "rt.com",
    "conspiracy-theories.net",
    "thetruthobserver.blog",
    "londondailytruth.site",
    "tech-expose.blog",
    "ocean-council.online",
    "medical-truth.blog",
];

pub const TRUSTED_TLDS: &[&str] = &[".gov", ".edu", ".int"];

pub const SUSPICIOUS_TLDS: &[&str] = &[".xyz", ".site", ".online", ".blog", ".top", ".buzz"];

/// Red-flag terms. Checked against full URLs here and against claim text by
/// the fusion engine's lexical penalty.
pub const RED_FLAG_KEYWORDS: &[&str] = &[
    "clickbait",
    "viral",
    "shocking",
    "truth-revealed",
    "breaking-now",
    "exclusive",
    "thetruth",
    "observer",
    "dailytruth",
    "leaked-document",
    "lockout",
    "smart-fridge",
    "silicon-based",
    "clandestine",
    "shadow-biosphere",
    "official-notice",
    "emergency-alert",
    "truth",
    "leaked",
    "memory-wipe",
    "mnem-7",
    "expiration-date",
    "bank-collective",
    "tidal-tax",
    "continental-shield",
    "micro-cellular",
    "ocean-council",
];

/// Lower-cased host with any `www.` prefix removed. Scheme-less input is
/// treated as `https://`. Ports are not part of the domain.
pub fn domain_of(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = Url::parse(&candidate).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Distinct red-flag keywords found in free text, at most `limit`, in list
/// order. Hyphens are read as spaces on both sides.
pub fn lexical_red_flags(text: &str, limit: usize) -> Vec<&'static str> {
    let haystack = normalize_hyphens(text);
    RED_FLAG_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| haystack.contains(&normalize_hyphens(kw)))
        .take(limit)
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn matches_list(domain: &str, list: &HashSet<String>) -> bool {
    list.iter()
        .any(|d| domain == d.as_str() || domain.ends_with(&format!(".{d}")))
}

pub struct SourceReputation {
    trusted: HashSet<String>,
    untrusted: HashSet<String>,
}

impl Default for SourceReputation {
    fn default() -> Self {
        Self {
            trusted: TRUSTED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            untrusted: UNTRUSTED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl SourceReputation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add domains to the trusted list.
    pub fn with_trusted<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted
            .extend(domains.into_iter().map(|d| d.into().to_lowercase()));
        self
    }

    /// Add domains to the untrusted list.
    pub fn with_untrusted<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.untrusted
            .extend(domains.into_iter().map(|d| d.into().to_lowercase()));
        self
    }

    pub fn is_trusted_domain(&self, domain: &str) -> bool {
        matches_list(domain, &self.trusted)
    }

    pub fn is_untrusted_domain(&self, domain: &str) -> bool {
        matches_list(domain, &self.untrusted)
    }

    /// Assess a URL. Pure and deterministic; never fails.
    pub fn assess<'a>(&self, url: impl Into<Option<&'a str>>) -> SourceAssessment {
        let url = match url.into().map(str::trim) {
            Some(u) if !u.is_empty() => u,
            _ => {
                return SourceAssessment::new(SourceStatus::Unknown, NEUTRAL_SCORE, "No source provided");
            }
        };

        let Some(domain) = domain_of(url) else {
            return SourceAssessment::new(SourceStatus::Invalid, 0.0, "Could not parse a domain from the URL");
        };

        if self.is_trusted_domain(&domain) {
            return SourceAssessment::new(
                SourceStatus::Trusted,
                TRUSTED_SCORE,
                format!("{domain} is a recognized trusted source"),
            );
        }
        if self.is_untrusted_domain(&domain) {
            return SourceAssessment::new(
                SourceStatus::Untrusted,
                0.0,
                format!("{domain} is a known untrusted source"),
            );
        }

        let lowered = if url.contains("://") {
            url.to_lowercase()
        } else {
            format!("https://{}", url.to_lowercase())
        };
        let mut score = NEUTRAL_SCORE;
        let mut reasons = Vec::new();

        if lowered.starts_with("https://") {
            score += HTTPS_BONUS;
            reasons.push("Uses HTTPS".to_string());
        }
        for tld in TRUSTED_TLDS.iter().filter(|t| domain.ends_with(*t)) {
            score += TRUSTED_TLD_BONUS;
            reasons.push(format!("Institutional domain ({tld})"));
        }
        for tld in SUSPICIOUS_TLDS.iter().filter(|t| domain.ends_with(*t)) {
            score -= SUSPICIOUS_TLD_PENALTY;
            reasons.push(format!("Suspicious top-level domain ({tld})"));
        }
        for kw in RED_FLAG_KEYWORDS.iter().filter(|kw| lowered.contains(*kw)) {
            score -= RED_FLAG_PENALTY;
            reasons.push(format!("Suspicious keyword in URL: {kw}"));
        }

        let score = round2(score.clamp(0.0, 1.0));
        let status = if score >= TRUSTED_THRESHOLD {
            SourceStatus::Trusted
        } else if score <= UNTRUSTED_THRESHOLD {
            SourceStatus::Untrusted
        } else {
            SourceStatus::Unknown
        };
        if reasons.is_empty() {
            reasons.push("No strong credibility signals detected".to_string());
        }

        SourceAssessment {
            status,
            score,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep() -> SourceReputation {
        SourceReputation::default()
    }

    #[test]
    fn missing_or_empty_url_is_neutral_unknown() {
        for a in [rep().assess(None), rep().assess(""), rep().assess("   ")] {
            assert_eq!(a.status, SourceStatus::Unknown);
            assert_eq!(a.score, 0.5);
        }
    }

    #[test]
    fn trusted_subdomain_short_circuits() {
        let a = rep().assess("https://www.bbc.co.uk/news/world-123");
        assert_eq!(a.status, SourceStatus::Trusted);
        assert_eq!(a.score, TRUSTED_SCORE);

        let a = rep().assess("http://news.bbc.co.uk/viral-shocking-story");
        assert_eq!(a.status, SourceStatus::Trusted);
        assert_eq!(a.score, TRUSTED_SCORE);
    }

    #[test]
    fn suffix_match_requires_label_boundary() {
        assert!(rep().is_trusted_domain("edition.cnn.com"));
        assert!(!rep().is_trusted_domain("notcnn.com"));
        assert!(!rep().is_untrusted_domain("sport.com"));
    }

    #[test]
    fn every_listed_domain_is_scored_by_its_list() {
        let rep = rep();
        for domain in TRUSTED_DOMAINS {
            for url in [
                format!("https://{domain}"),
                format!("http://www.{domain}/a/b?q=1#frag"),
                format!("https://news.{domain}/story"),
            ] {
                let a = rep.assess(url.as_str());
                assert_eq!(a.status, SourceStatus::Trusted, "{url}");
                assert_eq!(a.score, TRUSTED_SCORE, "{url}");
            }
        }
        for domain in UNTRUSTED_DOMAINS {
            for url in [format!("https://{domain}/x?y=1"), format!("https://www.{domain}")] {
                let a = rep.assess(url.as_str());
                assert_eq!(a.status, SourceStatus::Untrusted, "{url}");
                assert_eq!(a.score, 0.0, "{url}");
            }
        }
    }

    #[test]
    fn untrusted_domain_scores_zero() {
        let a = rep().assess("https://www.theonion.com/some-story");
        assert_eq!(a.status, SourceStatus::Untrusted);
        assert_eq!(a.score, 0.0);
    }

    #[test]
    fn unparseable_url_is_invalid() {
        let a = rep().assess("not a url at all");
        assert_eq!(a.status, SourceStatus::Invalid);
        assert_eq!(a.score, 0.0);
    }

    #[test]
    fn scheme_less_url_gets_https_bonus() {
        let a = rep().assess("example.org/article");
        assert_eq!(a.status, SourceStatus::Unknown);
        assert_eq!(a.score, 0.6);
        assert_eq!(a.reasons, vec!["Uses HTTPS".to_string()]);
    }

    #[test]
    fn plain_http_unknown_has_fallback_reason() {
        let a = rep().assess("http://example.org/article");
        assert_eq!(a.score, 0.5);
        assert_eq!(
            a.reasons,
            vec!["No strong credibility signals detected".to_string()]
        );
    }

    #[test]
    fn government_tld_is_promoted_to_trusted() {
        let a = rep().assess("https://data.example.gov/report");
        assert_eq!(a.score, 0.8);
        assert_eq!(a.status, SourceStatus::Trusted);
    }

    #[test]
    fn suspicious_tld_and_keywords_push_to_untrusted() {
        let a = rep().assess("https://daily-news.site/shocking-leaked-memo");
        // 0.5 + 0.1 - 0.15 - 0.25 (shocking) - 0.25 (leaked)
        assert_eq!(a.score, 0.0);
        assert_eq!(a.status, SourceStatus::Untrusted);
        assert!(a.reasons.iter().any(|r| r.contains(".site")));
    }

    #[test]
    fn port_is_not_part_of_domain() {
        assert_eq!(domain_of("https://reuters.com:8443/x"), Some("reuters.com".to_string()));
        assert_eq!(rep().assess("https://reuters.com:8443/x").status, SourceStatus::Trusted);
    }

    #[test]
    fn custom_lists_extend_defaults() {
        let r = SourceReputation::new()
            .with_trusted(["Local-Paper.np"])
            .with_untrusted(["fakes.example"]);
        assert_eq!(r.assess("local-paper.np").status, SourceStatus::Trusted);
        assert_eq!(r.assess("https://fakes.example").status, SourceStatus::Untrusted);
        assert_eq!(r.assess("reuters.com").status, SourceStatus::Trusted);
    }

    #[test]
    fn lexical_flags_read_hyphens_as_spaces() {
        let flags = lexical_red_flags("SHOCKING: leaked document shows breaking now", 2);
        assert_eq!(flags, vec!["shocking", "breaking-now"]);
        assert!(lexical_red_flags("Flood waters recede in Kathmandu", 2).is_empty());
    }
}
