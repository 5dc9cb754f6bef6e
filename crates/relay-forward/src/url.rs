//! Backend URL normalization.
//!
//! Users enter backend addresses loosely: without a scheme, with or
//! without the submission path. Normalization infers `http://` only for
//! hosts that look loopback or private-network local, and appends the
//! fixed submission suffix exactly once, so applying it twice changes
//! nothing.

/// Fixed path segment of the event-submission endpoint.
pub const SUBMISSION_SUFFIX: &str = "/receive_data";

/// Normalizes a user-supplied backend URL into the submission address.
pub fn normalize_backend_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else if is_local_host(trimmed) {
        format!("http://{trimmed}")
    } else {
        format!("https://{trimmed}")
    };

    if !url.ends_with(SUBMISSION_SUFFIX) {
        if url.ends_with('/') {
            url.pop();
        }
        url.push_str(SUBMISSION_SUFFIX);
    }
    url
}

/// Strips the submission suffix to get the base URL for health probes.
pub fn strip_submission_suffix(url: &str) -> String {
    url.strip_suffix(SUBMISSION_SUFFIX).unwrap_or(url).to_owned()
}

fn is_local_host(input: &str) -> bool {
    let host = input.split('/').next().unwrap_or(input);
    let host = host.split(':').next().unwrap_or(host);

    host == "localhost" || host == "127.0.0.1" || host.starts_with("192.168.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_public_host_gets_https_and_suffix() {
        assert_eq!(
            normalize_backend_url("backend.example.com"),
            "https://backend.example.com/receive_data"
        );
    }

    #[test]
    fn local_hosts_get_http() {
        assert_eq!(normalize_backend_url("127.0.0.1"), "http://127.0.0.1/receive_data");
        assert_eq!(normalize_backend_url("localhost"), "http://localhost/receive_data");
        assert_eq!(
            normalize_backend_url("192.168.1.20:8080"),
            "http://192.168.1.20:8080/receive_data"
        );
    }

    #[test]
    fn explicit_scheme_is_preserved() {
        assert_eq!(
            normalize_backend_url("http://backend.example.com"),
            "http://backend.example.com/receive_data"
        );
        assert_eq!(normalize_backend_url("https://127.0.0.1"), "https://127.0.0.1/receive_data");
    }

    #[test]
    fn existing_suffix_is_not_duplicated() {
        assert_eq!(
            normalize_backend_url("https://backend.example.com/receive_data"),
            "https://backend.example.com/receive_data"
        );
    }

    #[test]
    fn trailing_slash_does_not_double_up() {
        assert_eq!(
            normalize_backend_url("backend.example.com/"),
            "https://backend.example.com/receive_data"
        );
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(
            normalize_backend_url("  backend.example.com  "),
            "https://backend.example.com/receive_data"
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_backend_url(""), "");
        assert_eq!(normalize_backend_url("   "), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for input in
            ["backend.example.com", "localhost:9000", "https://x.example.com/receive_data", ""]
        {
            let once = normalize_backend_url(input);
            assert_eq!(normalize_backend_url(&once), once);
        }
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_hosts_normalize_idempotently(
            host in "[a-z0-9.-]{1,40}",
        ) {
            let once = normalize_backend_url(&host);
            proptest::prop_assert_eq!(normalize_backend_url(&once), once);
        }
    }

    #[test]
    fn strip_suffix_inverts_the_append() {
        assert_eq!(
            strip_submission_suffix("https://backend.example.com/receive_data"),
            "https://backend.example.com"
        );
        assert_eq!(strip_submission_suffix("https://backend.example.com"), "https://backend.example.com");
    }
}
