pub const SUPPORTED: &[&str] = &["en", "et", "fi", "sv", "ru", "lv", "lt", "no", "da", "pl", "de"];
pub const FALLBACK: &str = "en";

/// Normalise a language tag to a supported code. `"en-US"` becomes `"en"`,
/// anything unsupported becomes [`FALLBACK`].
pub fn sanitize(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return FALLBACK.to_string();
    }
    if SUPPORTED.contains(&normalized.as_str()) {
        return normalized;
    }
    let base = normalized
        .split(['-', '_'])
        .next()
        .filter(|b| !b.is_empty())
        .unwrap_or(normalized.as_str());
    if SUPPORTED.contains(&base) {
        base.to_string()
    } else {
        FALLBACK.to_string()
    }
}

/// The language the process is currently presenting. Created once at startup
/// and moved forward only through [`LocaleState::apply`].
#[derive(Debug, Default)]
pub struct LocaleState {
    applied: Option<String>,
}

impl LocaleState {
    pub fn new(initial: &str) -> Self {
        Self {
            applied: Some(sanitize(initial)),
        }
    }

    pub fn current(&self) -> &str {
        self.applied.as_deref().unwrap_or(FALLBACK)
    }

    /// Returns true when the sanitized code differs from what was applied.
    pub fn apply(&mut self, code: &str) -> bool {
        let sanitized = sanitize(code);
        if self.applied.as_deref() == Some(sanitized.as_str()) {
            return false;
        }
        log::debug!("locale switched to {sanitized}");
        self.applied = Some(sanitized);
        true
    }
}
