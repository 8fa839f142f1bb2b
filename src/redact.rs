//! Scrubs the upstream API key out of log-bound text.
//!
//! Upstream URLs carry the key as a query parameter, so it can surface in
//! transport error messages both verbatim and percent-encoded.

/// Replaces every occurrence of `secret` (raw and percent-encoded) in
/// `message` with `[redacted]`.
pub fn redact(message: &str, secret: &str) -> String {
    if secret.is_empty() {
        return message.to_string();
    }
    let encoded = urlencoding::encode(secret);
    let scrubbed = message.replace(secret, "[redacted]");
    if encoded != secret {
        scrubbed.replace(encoded.as_ref(), "[redacted]")
    } else {
        scrubbed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_raw_key() {
        let out = redact("GET https://host/feed?api_key=s3cret failed", "s3cret");
        assert!(!out.contains("s3cret"));
        assert!(out.contains("[redacted]"));
    }

    #[test]
    fn removes_percent_encoded_key() {
        let key = "ab+c/d=";
        let encoded = urlencoding::encode(key).to_string();
        let message = format!("url was ?api_key={encoded}, raw {key}");
        let out = redact(&message, key);
        assert!(!out.contains(key));
        assert!(!out.contains(&encoded));
    }

    #[test]
    fn empty_secret_is_left_alone() {
        assert_eq!(redact("nothing to hide", ""), "nothing to hide");
    }
}
