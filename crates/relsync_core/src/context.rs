//! Request-scoped context.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable per-request configuration threaded through every call.
///
/// Carries the locale and active user for hooks, and the rules that
/// translate identifier component names into entity field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    locale: Option<String>,
    user: Option<String>,
    aliases: HashMap<String, String>,
    locale_aliases: HashMap<String, HashMap<String, String>>,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Sets the active user.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Maps a component alias to an entity field for every locale.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>, field: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), field.into());
        self
    }

    /// Maps a component alias to an entity field for one locale only.
    #[must_use]
    pub fn with_locale_alias(
        mut self,
        locale: impl Into<String>,
        alias: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.locale_aliases
            .entry(locale.into())
            .or_default()
            .insert(alias.into(), field.into());
        self
    }

    /// Returns the request locale.
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Returns the active user.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Translates a component name into the entity field it refers to.
    ///
    /// Aliases of the active locale win over global ones; unknown names
    /// are returned unchanged.
    pub fn translate<'a>(&'a self, name: &'a str) -> &'a str {
        let localized = self
            .locale
            .as_ref()
            .and_then(|locale| self.locale_aliases.get(locale))
            .and_then(|aliases| aliases.get(name));

        localized
            .or_else(|| self.aliases.get(name))
            .map_or(name, String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_pass_through() {
        assert_eq!(Context::new().translate("id"), "id");
    }

    #[test]
    fn locale_alias_wins_over_global() {
        let ctx = Context::new()
            .with_alias("slug", "handle")
            .with_locale_alias("nl", "slug", "naam")
            .with_locale("nl");
        assert_eq!(ctx.translate("slug"), "naam");

        let other = ctx.clone().with_locale("en");
        assert_eq!(other.translate("slug"), "handle");
    }

    #[test]
    fn accessors() {
        let ctx = Context::new().with_user("alice").with_locale("en");
        assert_eq!(ctx.user(), Some("alice"));
        assert_eq!(ctx.locale(), Some("en"));
    }

    #[test]
    fn deserialize() {
        let ctx: Context =
            serde_json::from_str(r#"{"locale":"fr","aliases":{"code":"id"}}"#).unwrap();
        assert_eq!(ctx.locale(), Some("fr"));
        assert_eq!(ctx.translate("code"), "id");
    }
}
