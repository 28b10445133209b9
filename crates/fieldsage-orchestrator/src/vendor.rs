//! Vendor-domain lookup and citation verification
//!
//! The table is hand-maintained and incomplete. An unknown vendor skips the
//! official-only search phase, so its evidence is always tagged fallback.

use fieldsage_domain::EntityAnchor;
use url::Url;

/// Known vendor names (lowercase, matched as whole words) and their domains.
/// Multi-word names come first so "red hat" wins over any single word.
const VENDOR_DOMAINS: &[(&str, &str)] = &[
    ("red hat", "redhat.com"),
    ("amazon web services", "aws.amazon.com"),
    ("mongodb", "mongodb.com"),
    ("microsoft", "microsoft.com"),
    ("oracle", "oracle.com"),
    ("mysql", "mysql.com"),
    ("apache", "apache.org"),
    ("redhat", "redhat.com"),
    ("vmware", "vmware.com"),
    ("postgresql", "postgresql.org"),
    ("ibm", "ibm.com"),
    ("sap", "sap.com"),
    ("cisco", "cisco.com"),
    ("elastic", "elastic.co"),
    ("elasticsearch", "elastic.co"),
    ("redis", "redis.io"),
    ("docker", "docker.com"),
    ("atlassian", "atlassian.com"),
    ("adobe", "adobe.com"),
    ("salesforce", "salesforce.com"),
    ("canonical", "ubuntu.com"),
    ("ubuntu", "ubuntu.com"),
    ("aws", "aws.amazon.com"),
    ("google", "cloud.google.com"),
    ("nginx", "nginx.org"),
    ("python", "python.org"),
    ("node.js", "nodejs.org"),
    ("nodejs", "nodejs.org"),
    ("kubernetes", "kubernetes.io"),
    ("suse", "suse.com"),
];

/// Resolve the vendor domain for an anchor, if the vendor is known
pub fn resolve_vendor_domain(anchor: &EntityAnchor) -> Option<&'static str> {
    let haystack = format!(" {} ", anchor.as_str().to_lowercase());
    VENDOR_DOMAINS
        .iter()
        .find(|(name, _)| haystack.contains(&format!(" {} ", name)))
        .map(|(_, domain)| *domain)
}

/// Whether `url` is served from `domain` or one of its subdomains
pub fn host_matches(url: &str, domain: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Citations served from `domain`, in their original order
pub fn verified_citations(citations: &[String], domain: &str) -> Vec<String> {
    citations
        .iter()
        .filter(|url| host_matches(url, domain))
        .cloned()
        .collect()
}
