//! The four enforcement surfaces the agent owns: the host-name override
//! table, the packet-filter anchor, connection flush, and browser tab
//! close.

pub mod browser;
pub mod hosts;
pub mod packetfilter;
pub mod resolver;

/// The closed table of service-specific host-table variants (§4.2).
/// Outside this table, only the bare domain and its `www.` variant are
/// emitted.
pub fn service_variants(domain: &str) -> Vec<String> {
    match domain {
        "youtube.com" => {
            ["m.", "music."].iter().map(|p| format!("{p}{domain}")).chain([
                "youtu.be".to_string(),
                "youtube-nocookie.com".to_string(),
            ]).collect()
        }
        "twitter.com" | "x.com" => vec![format!("mobile.{domain}")],
        "reddit.com" => ["old.", "new.", "i."].iter().map(|p| format!("{p}{domain}")).collect(),
        "facebook.com" => {
            ["m.", "mobile.", "touch.", "web."].iter().map(|p| format!("{p}{domain}")).collect()
        }
        "instagram.com" => ["m.", "i.", "graph."].iter().map(|p| format!("{p}{domain}")).collect(),
        "tiktok.com" => ["m.", "www.", "vm."].iter().map(|p| format!("{p}{domain}")).collect(),
        _ => Vec::new(),
    }
}

/// All host-table names a canonical domain expands into: itself, its
/// `www.` variant, and any service-specific variants.
pub fn expand_names(domain: &str) -> Vec<String> {
    let mut names = vec![domain.to_string(), format!("www.{domain}")];
    names.extend(service_variants(domain));
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_expands_to_known_variants() {
        let names = expand_names("youtube.com");
        assert!(names.contains(&"youtube.com".to_string()));
        assert!(names.contains(&"www.youtube.com".to_string()));
        assert!(names.contains(&"m.youtube.com".to_string()));
        assert!(names.contains(&"music.youtube.com".to_string()));
        assert!(names.contains(&"youtu.be".to_string()));
        assert!(names.contains(&"youtube-nocookie.com".to_string()));
    }

    #[test]
    fn unknown_service_gets_only_bare_and_www() {
        let names = expand_names("example.com");
        assert_eq!(names, vec!["example.com".to_string(), "www.example.com".to_string()]);
    }
}
