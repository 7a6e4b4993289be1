use super::ParseError;

/// Maximum length of a domain name in wire format (RFC 1035 §2.3.4).
pub const MAX_NAME_LEN: usize = 255;
/// Maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;
/// Upper bound on compression pointer hops while reading one name.
const MAX_POINTER_HOPS: usize = 32;

/// Appends the trailing dot if `name` is not already fully qualified.
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        let mut s = String::with_capacity(name.len() + 1);
        s.push_str(name);
        s.push('.');
        s
    }
}

/// Non-empty labels of a name, in order. The root name yields none.
pub fn labels(name: &str) -> Vec<&str> {
    name.split('.').filter(|l| !l.is_empty()).collect()
}

/// Checks that `name` is a well-formed domain name: non-empty, label and
/// total length limits respected, no empty interior labels.
pub fn validate(name: &str) -> Result<(), ParseError> {
    if name.is_empty() {
        return Err(ParseError::BadName);
    }
    if name == "." {
        return Ok(());
    }
    let inner = name.strip_suffix('.').unwrap_or(name);
    let mut wire_len = 1; // root byte
    for label in inner.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(ParseError::BadName);
        }
        wire_len += 1 + label.len();
    }
    if wire_len > MAX_NAME_LEN {
        return Err(ParseError::BadName);
    }
    Ok(())
}

/// Case-insensitive name equality, trailing-dot insensitive.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    let a = a.strip_suffix('.').unwrap_or(a);
    let b = b.strip_suffix('.').unwrap_or(b);
    a.eq_ignore_ascii_case(b)
}

/// The name consisting of the last `n` labels of `name`, fully qualified.
/// Used to reconstruct the owner of wildcard-expanded RRsets.
pub fn suffix(name: &str, n: usize) -> String {
    let labels = labels(name);
    if n >= labels.len() {
        return fqdn(name);
    }
    let mut s = String::new();
    for label in &labels[labels.len() - n..] {
        s.push_str(label);
        s.push('.');
    }
    if s.is_empty() {
        s.push('.');
    }
    s
}

/// True when `zone` equals `name` or is an ancestor of it, comparing
/// whole labels case-insensitively.
pub fn is_parent_of(zone: &str, name: &str) -> bool {
    let zone_labels = labels(zone);
    let name_labels = labels(name);
    if zone_labels.len() > name_labels.len() {
        return false;
    }
    zone_labels
        .iter()
        .rev()
        .zip(name_labels.iter().rev())
        .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

/// Encodes `name` in uncompressed wire format, preserving case.
pub fn to_wire(name: &str) -> Result<Vec<u8>, ParseError> {
    validate(name)?;
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in labels(name) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(out)
}

/// Encodes `name` in canonical wire format: uncompressed, lowercased
/// (RFC 4034 §6.2). All DNSSEC digests and signatures are computed over
/// this form.
pub fn to_wire_canonical(name: &str) -> Result<Vec<u8>, ParseError> {
    let mut wire = to_wire(name)?;
    wire.make_ascii_lowercase();
    Ok(wire)
}

/// Reads a possibly-compressed name at `pos` in `buf`.
///
/// Returns the presentation-form name and the position just past the name
/// in the original (non-pointer) byte stream.
pub fn read_name(buf: &[u8], pos: usize) -> Result<(String, usize), ParseError> {
    let mut name = String::new();
    let mut pos = pos;
    let mut next = None; // resume position after the first pointer
    let mut hops = 0;

    loop {
        let len = *buf.get(pos).ok_or(ParseError::UnexpectedEnd)? as usize;
        match len {
            0 => {
                pos += 1;
                break;
            }
            l if l <= MAX_LABEL_LEN => {
                let label = buf
                    .get(pos + 1..pos + 1 + l)
                    .ok_or(ParseError::UnexpectedEnd)?;
                for &b in label {
                    // Escape nothing; fixture data and real zones in scope
                    // here are plain ASCII hostnames.
                    name.push(b as char);
                }
                name.push('.');
                pos += 1 + l;
            }
            l if l & 0xC0 == 0xC0 => {
                let second = *buf.get(pos + 1).ok_or(ParseError::UnexpectedEnd)?;
                let target = ((len & 0x3F) << 8) | second as usize;
                if next.is_none() {
                    next = Some(pos + 2);
                }
                if target >= pos {
                    return Err(ParseError::BadPointer);
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(ParseError::BadPointer);
                }
                pos = target;
            }
            _ => return Err(ParseError::BadLabel),
        }
        if name.len() > MAX_NAME_LEN * 4 {
            return Err(ParseError::BadName);
        }
    }

    if name.is_empty() {
        name.push('.');
    }
    Ok((name, next.unwrap_or(pos)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqdn_appends_dot_once() {
        assert_eq!(fqdn("example.org"), "example.org.");
        assert_eq!(fqdn("example.org."), "example.org.");
        assert_eq!(fqdn("."), ".");
    }

    #[test]
    fn labels_skip_root() {
        assert_eq!(labels("stakey.org."), vec!["stakey", "org"]);
        assert!(labels(".").is_empty());
    }

    #[test]
    fn wire_roundtrip() {
        let wire = to_wire("Example.ORG.").unwrap();
        assert_eq!(wire[0], 7);
        let (name, consumed) = read_name(&wire, 0).unwrap();
        assert_eq!(name, "Example.ORG.");
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn canonical_wire_is_lowercase() {
        let wire = to_wire_canonical("Example.ORG.").unwrap();
        assert_eq!(wire, to_wire("example.org.").unwrap());
    }

    #[test]
    fn root_name_wire() {
        assert_eq!(to_wire(".").unwrap(), vec![0]);
        let (name, consumed) = read_name(&[0], 0).unwrap();
        assert_eq!(name, ".");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn compressed_name() {
        // "org." at offset 0, "stakey" + pointer to 0 at offset 5.
        let mut buf = vec![3, b'o', b'r', b'g', 0];
        buf.extend_from_slice(&[6, b's', b't', b'a', b'k', b'e', b'y', 0xC0, 0x00]);
        let (name, consumed) = read_name(&buf, 5).unwrap();
        assert_eq!(name, "stakey.org.");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn forward_pointer_rejected() {
        let buf = vec![0xC0, 0x04, 0, 0, 0];
        assert!(read_name(&buf, 0).is_err());
    }

    #[test]
    fn validate_limits() {
        assert!(validate("").is_err());
        assert!(validate(&"a".repeat(64)).is_err());
        assert!(validate("a..b.").is_err());
        assert!(validate("stakey.org.").is_ok());
    }

    #[test]
    fn parent_relation() {
        assert!(is_parent_of("org.", "stakey.org."));
        assert!(is_parent_of("stakey.org.", "stakey.org."));
        assert!(is_parent_of(".", "stakey.org."));
        assert!(!is_parent_of("com.", "stakey.org."));
        assert!(!is_parent_of("key.org.", "stakey.org."));
        assert!(!is_parent_of("testnet-seed.stakey.org.", "stakey.org."));
    }

    #[test]
    fn suffix_labels() {
        assert_eq!(suffix("testnet-seed.stakey.org.", 2), "stakey.org.");
        assert_eq!(suffix("stakey.org.", 0), ".");
        assert_eq!(suffix("org.", 5), "org.");
    }
}
