//! Live lookups against real nameservers. These exercise the full
//! UDP transport and current production signatures, so they only run on
//! demand: `cargo test -- --ignored`.

use vordr::dns::enums::RecordType;
use vordr::Resolver;

fn live_resolver() -> Resolver {
    Resolver::new("testdata/resolv.conf").expect("testdata/resolv.conf must parse")
}

#[tokio::test]
#[ignore = "requires network access"]
async fn validated_lookup_of_signed_zone() {
    let resolver = live_resolver();
    let lookup = resolver.lookup_ip("stakey.org.").await.unwrap();
    assert!(lookup.is_secure());
    assert!(!lookup.addrs.is_empty());
}

#[tokio::test]
#[ignore = "requires network access"]
async fn unsigned_zone_reported_insecure() {
    let resolver = live_resolver();
    let lookup = resolver.lookup_ipv4("google.com.").await.unwrap();
    assert!(!lookup.is_secure());
    assert!(!lookup.addrs.is_empty());
}

#[tokio::test]
#[ignore = "requires network access"]
async fn deliberately_broken_signature_fails() {
    // A zone publishing an intentionally invalid signature.
    let resolver = live_resolver();
    let result = resolver.lookup_ip("sigfail.verteiltesysteme.net.").await;
    assert!(result.is_err(), "expected validation failure, got {:?}", result);
}

#[tokio::test]
#[ignore = "requires network access"]
async fn strict_query_returns_signed_records() {
    let resolver = live_resolver();
    let records = resolver
        .strict_query("stakey.org.", RecordType::A)
        .await
        .unwrap();
    assert!(!records.is_empty());
}
