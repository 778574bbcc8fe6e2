//! Provider webhook signature checks. Event bodies are only parsed after one of
//! these returns `true`.

use ring::hmac;

/// Stripe signatures older than this are replays.
pub const STRIPE_TOLERANCE_SECS: i64 = 300;

/// `X-CC-Webhook-Signature`: hex HMAC-SHA256 of the raw body.
pub fn verify_coinbase(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(tag) = hex::decode(signature.trim()) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, payload, &tag).is_ok()
}

/// `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]` over `"<t>.<body>"`.
pub fn verify_stripe(payload: &[u8], header: &str, secret: &str, now: i64) -> bool {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = v.parse::<i64>().ok(),
            Some(("v1", v)) => candidates.push(v),
            _ => {}
        }
    }
    let Some(t) = timestamp else {
        return false;
    };
    if (now - t).abs() > STRIPE_TOLERANCE_SECS {
        return false;
    }

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let mut signed = format!("{t}.").into_bytes();
    signed.extend_from_slice(payload);
    candidates.into_iter().any(|c| {
        hex::decode(c)
            .map(|tag| hmac::verify(&key, &signed, &tag).is_ok())
            .unwrap_or(false)
    })
}

#[cfg(test)]
pub(crate) fn sign_coinbase(payload: &[u8], secret: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hex::encode(hmac::sign(&key, payload).as_ref())
}

#[cfg(test)]
pub(crate) fn sign_stripe(payload: &[u8], secret: &str, t: i64) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let mut signed = format!("{t}.").into_bytes();
    signed.extend_from_slice(payload);
    format!("t={t},v1={}", hex::encode(hmac::sign(&key, &signed).as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"event":{"type":"charge:confirmed"}}"#;

    #[test]
    fn coinbase_accepts_matching_signature() {
        let sig = sign_coinbase(BODY, "whsec");
        assert!(verify_coinbase(BODY, &sig, "whsec"));
    }

    #[test]
    fn coinbase_rejects_tampering() {
        let sig = sign_coinbase(BODY, "whsec");
        assert!(!verify_coinbase(b"{}", &sig, "whsec"));
        assert!(!verify_coinbase(BODY, &sig, "other"));
        assert!(!verify_coinbase(BODY, "zz-not-hex", "whsec"));
        assert!(!verify_coinbase(BODY, "", "whsec"));
    }

    #[test]
    fn stripe_accepts_fresh_signature() {
        let header = sign_stripe(BODY, "whsec_stripe", 1_700_000_000);
        assert!(verify_stripe(BODY, &header, "whsec_stripe", 1_700_000_100));
    }

    #[test]
    fn stripe_accepts_any_matching_v1() {
        let signed = sign_stripe(BODY, "whsec_stripe", 1_700_000_000);
        let (t, v1) = signed.split_once(',').unwrap();
        let header = format!("{t},v1=deadbeef,{v1}");
        assert!(verify_stripe(BODY, &header, "whsec_stripe", 1_700_000_000));
    }

    #[test]
    fn stripe_rejects_stale_or_malformed() {
        let header = sign_stripe(BODY, "whsec_stripe", 1_700_000_000);
        assert!(!verify_stripe(BODY, &header, "whsec_stripe", 1_700_000_000 + STRIPE_TOLERANCE_SECS + 1));
        assert!(!verify_stripe(BODY, "v1=abcd", "whsec_stripe", 1_700_000_000));
        assert!(!verify_stripe(BODY, &header, "wrong", 1_700_000_000));
    }
}
