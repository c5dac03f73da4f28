use super::listing::host_matches;

/// How a bucket is addressed in request URLs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BucketLookup {
    /// `https://bucket.host/key`
    VirtualHost,
    /// `https://host/bucket/key`
    #[default]
    Path,
}

/// Endpoint pattern served with virtual-host style requests.
///
/// Patterns follow the same rules as listing rules: a leading `.` matches
/// any subdomain, anything else must equal the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressingRule {
    pub pattern: String,
    pub lookup: BucketLookup,
}

impl AddressingRule {
    pub fn new(pattern: impl Into<String>, lookup: BucketLookup) -> Self {
        Self {
            pattern: pattern.into(),
            lookup,
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        host_matches(&self.pattern, host)
    }
}

/// Ordered addressing rules; the first match wins, path style otherwise.
///
/// Self-hosted services rarely have wildcard DNS for bucket subdomains,
/// so only well known providers get virtual-host requests by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressingRules(Vec<AddressingRule>);

impl Default for AddressingRules {
    fn default() -> Self {
        Self(vec![
            AddressingRule::new(".amazonaws.com", BucketLookup::VirtualHost),
            AddressingRule::new(".amazonaws.com.cn", BucketLookup::VirtualHost),
            AddressingRule::new("storage.googleapis.com", BucketLookup::VirtualHost),
            AddressingRule::new(".aliyuncs.com", BucketLookup::VirtualHost),
        ])
    }
}

impl AddressingRules {
    /// Path style for every endpoint
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn with_rule(mut self, rule: AddressingRule) -> Self {
        self.0.push(rule);
        self
    }

    pub fn rules(&self) -> &[AddressingRule] {
        &self.0
    }

    pub fn lookup_for(&self, host: &str) -> BucketLookup {
        self.0
            .iter()
            .find(|rule| rule.matches(host))
            .map(|rule| rule.lookup)
            .unwrap_or_default()
    }
}
