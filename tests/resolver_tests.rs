mod common;

use common::fixture_resolver;
use vordr::dns::enums::RecordType;
use vordr::{ResolveError, ValidationStatus};

#[tokio::test]
async fn unsigned_answer_returns_records_as_insecure() {
    let resolver = fixture_resolver("unsigned");
    let lookup = resolver.lookup_ipv4("google.com.").await.unwrap();
    assert_eq!(lookup.status, ValidationStatus::Insecure);
    assert!(!lookup.is_secure());
    assert_eq!(lookup.addrs.len(), 2);
}

#[tokio::test]
async fn unsigned_answer_refused_by_strict_query() {
    let resolver = fixture_resolver("unsigned");
    let err = resolver
        .strict_query("google.com.", RecordType::A)
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::ResourceNotSigned);
}

#[tokio::test]
async fn lookup_ip_merges_insecure_branches() {
    let resolver = fixture_resolver("unsigned");
    let lookup = resolver.lookup_ip("google.com.").await.unwrap();
    assert_eq!(lookup.status, ValidationStatus::Insecure);
    assert_eq!(lookup.addrs.len(), 3); // two A, one AAAA
}

#[tokio::test]
async fn nxdomain_is_no_result() {
    let resolver = fixture_resolver("unsigned");
    let err = resolver
        .strict_query("non-existent-domain-34545345.org.", RecordType::Txt)
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::NoResult);
}

#[tokio::test]
async fn empty_answer_is_no_result() {
    let resolver = fixture_resolver("unsigned");
    let err = resolver
        .strict_query("empty.example.org.", RecordType::A)
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::NoResult);
}

#[tokio::test]
async fn empty_name_is_rejected() {
    let resolver = fixture_resolver("unsigned");
    let err = resolver.strict_query("", RecordType::A).await.unwrap_err();
    assert!(matches!(err, ResolveError::InvalidQuery(_)));
}

#[tokio::test]
async fn malformed_name_is_rejected() {
    let resolver = fixture_resolver("unsigned");
    let err = resolver
        .strict_query("bad..name.org.", RecordType::A)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidQuery(_)));
}

#[tokio::test]
async fn zone_without_dnskeys_fails_lookup() {
    let resolver = fixture_resolver("nokeys");
    let err = resolver.lookup_ipv4("stakey.org.").await.unwrap_err();
    assert_eq!(err, ResolveError::DnskeyNotAvailable);
}

#[tokio::test]
async fn corrupted_answer_signature_is_invalid_rrsig() {
    // The fixture answer is covered by an RRSIG naming a key the zone
    // publishes, but its signature bytes are garbage.
    let resolver = fixture_resolver("stakey");
    let err = resolver.lookup_ipv4("stakey.org.").await.unwrap_err();
    assert_eq!(err, ResolveError::InvalidRrsig);
}

#[tokio::test]
async fn verification_is_idempotent() {
    let resolver = fixture_resolver("stakey");
    let first = resolver.lookup_ipv4("stakey.org.").await.unwrap_err();
    let second = resolver.lookup_ipv4("stakey.org.").await.unwrap_err();
    assert_eq!(first, second);
}

#[tokio::test]
async fn lookup_ip_reports_branch_verification_failure() {
    // A records fail verification while the AAAA branch has no result;
    // the aggregate lookup reports the verification failure.
    let resolver = fixture_resolver("stakey");
    let err = resolver.lookup_ip("stakey.org.").await.unwrap_err();
    assert_eq!(err, ResolveError::InvalidRrsig);
}
