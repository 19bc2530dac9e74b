//! The closed set of installer-facing category bundles that seed the
//! initial blocklist.

/// A named bundle of default domains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Social,
    Video,
    News,
    Shopping,
    Adult,
    Gambling,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Social,
        Category::Video,
        Category::News,
        Category::Shopping,
        Category::Adult,
        Category::Gambling,
    ];

    /// The categories seeded by default, absent an explicit `--all-categories`
    /// installer argument.
    pub const DEFAULT: [Category; 4] =
        [Category::Social, Category::Video, Category::News, Category::Adult];

    pub fn name(self) -> &'static str {
        match self {
            Category::Social => "social",
            Category::Video => "video",
            Category::News => "news",
            Category::Shopping => "shopping",
            Category::Adult => "adult",
            Category::Gambling => "gambling",
        }
    }

    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.name() == name)
    }

    /// The domains this category contributes to a fresh blocklist.
    pub fn domains(self) -> &'static [&'static str] {
        match self {
            Category::Social => {
                &["facebook.com", "instagram.com", "twitter.com", "x.com", "tiktok.com"]
            }
            Category::Video => &["youtube.com", "twitch.tv", "netflix.com"],
            Category::News => &["reddit.com", "news.ycombinator.com", "cnn.com"],
            Category::Shopping => &["amazon.com", "ebay.com", "aliexpress.com"],
            Category::Adult => &["pornhub.com", "xvideos.com", "xnxx.com"],
            Category::Gambling => &["bet365.com", "draftkings.com", "pokerstars.com"],
        }
    }
}

/// The domains seeded by a given set of categories, deduplicated.
pub fn seed_domains(categories: &[Category]) -> Vec<String> {
    let mut seen = foldhash::HashSet::default();
    let mut out = Vec::new();
    for category in categories {
        for domain in category.domains() {
            if seen.insert(*domain) {
                out.push(domain.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_seed_is_nonempty() {
        let domains = seed_domains(&Category::DEFAULT);
        assert!(!domains.is_empty());
        assert!(domains.iter().any(|d| d == "twitter.com"));
    }

    #[test]
    fn round_trips_names() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.name()), Some(category));
        }
    }
}
