//! User-facing message rendering.

/// Key of the message shown when a cancel request carries the wrong key.
/// Argument `{0}` is the task ID.
pub const INCORRECT_CANCEL_TOKEN: &str = "ironclock.tasks.cancel.incorrect.token";

/// Renders message keys into human-readable text.
pub trait MessageResolver: Send + Sync {
    /// Render `key`, substituting `{0}`, `{1}`, ... with `args`.
    fn text(&self, key: &str, args: &[String]) -> String;
}

/// English messages. Unknown keys render as the key itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMessageResolver;

impl MessageResolver for DefaultMessageResolver {
    fn text(&self, key: &str, args: &[String]) -> String {
        let template = match key {
            INCORRECT_CANCEL_TOKEN => "Incorrect cancel token for task {0}",
            _ => return key.to_string(),
        };
        args.iter()
            .enumerate()
            .fold(template.to_string(), |text, (i, arg)| {
                text.replace(&format!("{{{}}}", i), arg)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resolver() {
        let resolver = DefaultMessageResolver;
        assert_eq!(
            resolver.text(INCORRECT_CANCEL_TOKEN, &["abc".to_string()]),
            "Incorrect cancel token for task abc"
        );
        assert_eq!(resolver.text("unknown.key", &[]), "unknown.key");
    }
}
