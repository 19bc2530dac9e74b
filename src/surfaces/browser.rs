//! Surface 4: best-effort browser tab close.
//!
//! Drives the scriptable interface of known browsers to close tabs whose
//! URL matches a blocked domain. Never load-bearing: failures are logged
//! and ignored.

/// AppleScript closing every Safari/Chrome tab whose URL contains `domain`.
fn script_for(domain: &str) -> String {
    format!(
        r#"
        tell application "Safari"
            if it is running then
                repeat with w in windows
                    repeat with t in (tabs of w)
                        if (URL of t) contains "{domain}" then close t
                    end repeat
                end repeat
            end if
        end tell
        tell application "Google Chrome"
            if it is running then
                repeat with w in windows
                    repeat with t in (tabs of w)
                        if (URL of t) contains "{domain}" then close t
                    end repeat
                end repeat
            end if
        end tell
        "#
    )
}

/// Best-effort: close open tabs on `domain` in known browsers. Errors are
/// returned so the caller can log them, but they never propagate as a
/// request failure.
pub async fn close_tabs(domain: &str) -> Result<(), String> {
    let mut command = tokio::process::Command::new("osascript");
    command.arg("-e").arg(script_for(domain));
    crate::util::run_best_effort(command).await.map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_embeds_the_domain() {
        assert!(script_for("twitter.com").contains("twitter.com"));
    }
}
