//! Shared helpers for fixture-driven resolver tests.

#![allow(dead_code)]

use std::sync::Arc;

use vordr::{FixtureTransport, Resolver, ResolverOpts};

/// 15 March 2019 00:00:00 UTC, inside the validity period of every
/// RRSIG in the fixture data.
pub const FIXED_TIME: u32 = 1552608000;

/// A resolver replaying fixtures from `testdata/<dir>`, with the chain
/// walk stopped at the org. TLD and the clock pinned to `FIXED_TIME`.
pub fn fixture_resolver(dir: &str) -> Resolver {
    let transport = FixtureTransport::new(format!("testdata/{}", dir));
    let mut resolver = Resolver::with_transport(
        Arc::new(transport),
        ResolverOpts {
            trust_zone: "org.".to_string(),
        },
    );
    resolver.set_current_time(FIXED_TIME);
    resolver
}
