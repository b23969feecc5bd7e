#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HydrationConfig {
    /// Containers whose children may include nodes no component claimed
    /// (e.g. `<head>`, shared with the host page). Unclaimed children there
    /// are left where they are instead of being treated as a contract violation.
    pub shared_containers: Vec<String>,
    /// Comment text marking the start of a raw HTML block.
    pub html_tag_start: String,
    /// Comment text marking the end of a raw HTML block.
    pub html_tag_end: String,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            shared_containers: vec!["head".to_string()],
            html_tag_start: "HTML_TAG_START".to_string(),
            html_tag_end: "HTML_TAG_END".to_string(),
        }
    }
}

impl HydrationConfig {
    pub fn is_shared_container(&self, name: &str) -> bool {
        self.shared_containers
            .iter()
            .any(|shared| shared.eq_ignore_ascii_case(name))
    }
}
