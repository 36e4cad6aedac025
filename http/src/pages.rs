//! Server-rendered pages for the verification flow.
//!
//! Deliberately plain: a handful of `format!` templates with a shared shell,
//! no template engine. User-controlled fields are HTML-escaped before
//! interpolation.

use gatelink_core::VerificationRecord;

/// Minimal HTML escaping for text interpolated into the templates.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; background: #24243e; color: #fff;
       display: flex; justify-content: center; align-items: center;
       height: 100vh; margin: 0; }}
.card {{ background: rgba(0,0,0,0.7); padding: 2rem; border-radius: 12px;
        text-align: center; width: 380px; border: 2px solid #9c27b0; }}
.card img {{ width: 96px; height: 96px; border-radius: 50%; }}
.name {{ background: rgba(0,0,0,0.5); padding: 0.8rem; border-radius: 8px;
        margin: 1rem 0; font-size: 1.1rem; }}
button {{ background: #9c27b0; color: #fff; border: none;
         padding: 0.7rem 2rem; font-size: 1rem; border-radius: 24px;
         cursor: pointer; }}
.ok {{ border-color: #4caf50; }}
.error {{ color: #ff5252; margin-top: 1rem; }}
</style>
</head>
<body>
<div class="card">{body}</div>
</body>
</html>
"#
    )
}

/// Message shown on the challenge page when the display-time verdict was
/// suspicious. Advisory: the authoritative check happens on submission.
const SUSPICIOUS_NOTICE: &str = "VPN or proxy detected! Disable it to verify.";

/// The challenge page: subject identity plus the submit form.
pub fn challenge(record: &VerificationRecord, suspicious: bool) -> String {
    let notice = if suspicious {
        format!(r#"<p class="error">{SUSPICIOUS_NOTICE}</p>"#)
    } else {
        String::new()
    };
    let avatar = if record.avatar_url.is_empty() {
        String::new()
    } else {
        format!(r#"<img src="{}" alt="avatar">"#, escape(&record.avatar_url))
    };
    let body = format!(
        r#"{avatar}
<h2>Verification</h2>
<p>Complete verification to access the server</p>
<div class="name">{name}</div>
<form action="/verify" method="POST">
<input type="hidden" name="token" value="{token}">
<button type="submit">Verify now</button>
</form>
{notice}"#,
        name = escape(&record.display_name),
        token = escape(record.token.as_str()),
    );
    shell("Verification", &body)
}

/// Confirmation page after a successful submission.
pub fn verified() -> String {
    shell(
        "Verified",
        r#"<div class="ok"><h2>Verification complete</h2>
<p>You have been successfully verified.</p>
<p>Your access will be granted shortly.</p></div>"#,
    )
}

/// Page for the idempotent race outcome: someone (usually the same person,
/// double-clicking) already completed this token.
pub fn already_verified() -> String {
    shell(
        "Verified",
        r#"<h2>Already verified</h2>
<p>This verification link has already been completed.</p>"#,
    )
}

/// Generic not-found page for unknown, consumed, or expired tokens.
pub fn not_found() -> String {
    shell(
        "Invalid link",
        r#"<h2>Invalid or expired link</h2>
<p>Request a new verification link and try again.</p>"#,
    )
}

pub fn internal_error() -> String {
    shell(
        "Error",
        r#"<h2>Something went wrong</h2>
<p>Please try again later.</p>"#,
    )
}
