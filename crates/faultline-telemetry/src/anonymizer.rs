//! Text anonymization for outgoing reports
//!
//! Replaces personally identifiable information (home directory, username,
//! file names) with generic placeholders before report text leaves the
//! process through the chat webhook.

use faultline_core::config::AnonymizeConfig;

/// Characters that end a path segment when scanning for file names
const SEGMENT_END: &[char] = &['/', ' ', '\n', '\t', ':', '"', '\'', '(', ')', ','];

/// Anonymizes text based on the provided configuration.
#[derive(Debug, Clone)]
pub struct Anonymizer {
    strip_paths: bool,
    strip_usernames: bool,
    strip_filenames: bool,
    home_dir: String,
    username: String,
}

impl Anonymizer {
    /// Creates a new `Anonymizer` for the current user.
    pub fn new(config: &AnonymizeConfig) -> Self {
        let home_dir = dirs::home_dir()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_default();

        Self::with_identity(config, home_dir, username)
    }

    /// Creates an `Anonymizer` for an explicit home directory and username.
    pub fn with_identity(
        config: &AnonymizeConfig,
        home_dir: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            strip_paths: config.strip_paths,
            strip_usernames: config.strip_usernames,
            strip_filenames: config.strip_filenames,
            home_dir: home_dir.into(),
            username: username.into(),
        }
    }

    /// Anonymize the given text by applying configured replacements.
    ///
    /// The home directory is replaced before the username so that
    /// `/home/jdoe/x` becomes `<HOME>/x` rather than `/home/<USER>/x`.
    pub fn anonymize(&self, text: &str) -> String {
        let mut result = text.to_string();

        // A bare "/" home would turn every separator into a placeholder.
        if self.strip_paths && self.home_dir.len() > 1 {
            result = result.replace(&self.home_dir, "<HOME>");
        }

        // Very short usernames produce too many false matches.
        if self.strip_usernames && self.username.len() > 2 {
            result = result.replace(&self.username, "<USER>");
        }

        if self.strip_filenames {
            result = anonymize_filenames(&result);
        }

        result
    }
}

/// Replace the base name of path-like segments that carry an extension.
///
/// `/srv/app/orders.csv` becomes `/srv/app/<FILE>.csv`; directory segments
/// and extension-less names are left alone.
fn anonymize_filenames(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(slash) = rest.find('/') {
        result.push_str(&rest[..=slash]);
        rest = &rest[slash + 1..];

        let end = rest.find(SEGMENT_END).unwrap_or(rest.len());
        let segment = &rest[..end];

        match segment.rfind('.') {
            Some(dot) if dot > 0 && dot + 1 < segment.len() && rest[end..].chars().next() != Some('/') => {
                result.push_str("<FILE>");
                result.push_str(&segment[dot..]);
            }
            _ => result.push_str(segment),
        }
        rest = &rest[end..];
    }

    result.push_str(rest);
    result
}
