//! Dispatcher configuration

use serde::Deserialize;

use crate::error::ConfigError;
use crate::outcome::MessageTemplate;

/// Header and field names plus message settings used by the dispatcher
///
/// Every field has a default, so a partial JSON document only overrides
/// what it names.
///
/// # Example
///
/// ```
/// use record_actions_core::DispatcherConfig;
///
/// let config = DispatcherConfig::from_json(r#"{"status_header": "X-Message"}"#).unwrap();
/// assert_eq!(config.status_header, "X-Message");
/// assert_eq!(config.reload_header, "X-Reload");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Response header carrying the URL-encoded outcome message
    pub status_header: String,
    /// Response header asking the client to reload its content region
    pub reload_header: String,
    /// Content-region marker header
    pub pjax_header: String,
    /// Value of the content-region marker
    pub pjax_region: String,
    /// Form field holding the `{action: title}` object of custom actions
    pub action_field: String,
    /// Query variable naming the action of a custom link
    pub link_var: String,
    /// Form field holding the security token
    pub token_field: String,
    /// Message used when an action gives none
    pub default_message: String,
    /// Contain panics raised by action handlers
    pub catch_panics: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            status_header: "X-Status".to_string(),
            reload_header: "X-Reload".to_string(),
            pjax_header: "X-Pjax".to_string(),
            pjax_region: "Content".to_string(),
            action_field: "action_doCustomAction".to_string(),
            link_var: "CustomLink".to_string(),
            token_field: "SecurityID".to_string(),
            default_message: MessageTemplate::default().as_str().to_string(),
            catch_panics: true,
        }
    }
}

impl DispatcherConfig {
    /// Parse a JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the message template names the action
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_message.contains("{action}") {
            return Err(ConfigError::Template {
                template: self.default_message.clone(),
                placeholder: "{action}",
            });
        }
        Ok(())
    }

    /// The default message as a template
    pub fn message_template(&self) -> MessageTemplate {
        MessageTemplate::new(self.default_message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.status_header, "X-Status");
        assert_eq!(config.pjax_region, "Content");
        assert_eq!(config.action_field, "action_doCustomAction");
        assert!(config.catch_panics);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = DispatcherConfig::from_json(
            r#"{"default_message": "{action} applied to {name}", "catch_panics": false}"#,
        )
        .unwrap();
        assert!(!config.catch_panics);
        assert_eq!(
            config.message_template().render("Unlock", "Member"),
            "Unlock applied to Member"
        );
        assert_eq!(config.link_var, "CustomLink");
    }

    #[test]
    fn test_template_without_action_is_rejected() {
        let err = DispatcherConfig::from_json(r#"{"default_message": "Done"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Template { placeholder: "{action}", .. }));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = DispatcherConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
