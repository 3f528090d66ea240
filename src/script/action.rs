//! Host→script instructions

use std::fmt::Write;

/// Global object the bootstrap installs in the page
pub const BRIDGE_OBJECT: &str = "window.beaconBridge";

/// Function on [`BRIDGE_OBJECT`] that resolves a pending fetch
pub const RESOLVE_FETCH: &str = "resolveFetch";

/// An instruction waiting to be executed in the script engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptAction {
    /// Call a bridge function with a callback id and a JSON payload string
    Invoke {
        function: String,
        callback_id: String,
        payload: String,
    },
    /// Run a script fragment as-is
    Raw(String),
}

impl ScriptAction {
    pub fn invoke(
        function: impl Into<String>,
        callback_id: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        ScriptAction::Invoke {
            function: function.into(),
            callback_id: callback_id.into(),
            payload: payload.into(),
        }
    }

    /// Deliver a serialized fetch response to the waiting script caller
    pub fn resolve_fetch(callback_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::invoke(RESOLVE_FETCH, callback_id, payload)
    }

    /// Render the script source to evaluate
    pub fn to_script(&self) -> String {
        match self {
            ScriptAction::Invoke {
                function,
                callback_id,
                payload,
            } => format!(
                "{}.{}('{}', '{}');",
                BRIDGE_OBJECT,
                function,
                escape_single_quoted(callback_id),
                escape_single_quoted(payload)
            ),
            ScriptAction::Raw(script) => script.clone(),
        }
    }
}

/// Escape text for embedding in a single-quoted script string literal
pub fn escape_single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\x00"),
            '<' => out.push_str("\\x3C"),
            '\u{2028}' | '\u{2029}' => {
                let _ = write!(out, "\\u{:04X}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape_single_quoted("it's"), "it\\'s");
        assert_eq!(escape_single_quoted("a\\b"), "a\\\\b");
        assert_eq!(escape_single_quoted("l1\nl2\r"), "l1\\nl2\\r");
        assert_eq!(escape_single_quoted("</script>"), "\\x3C/script>");
        assert_eq!(escape_single_quoted("x\u{2028}y"), "x\\u2028y");
    }

    #[test]
    fn test_invoke_script() {
        let action = ScriptAction::resolve_fetch("cb'1", r#"{"body":"it's"}"#);
        assert_eq!(
            action.to_script(),
            r#"window.beaconBridge.resolveFetch('cb\'1', '{"body":"it\'s"}');"#
        );
    }

    #[test]
    fn test_raw_script() {
        let action = ScriptAction::Raw("console.log(1);".to_string());
        assert_eq!(action.to_script(), "console.log(1);");
    }
}
