//! Attribute Decoding Tests.
//!
//! Verifies the mapping from protocol attribute words (or the static
//! configuration) to the per-access policy booleans, including custom
//! attribute layouts.

use cachesim_core::cache::attr::{AccessPolicy, AttributeLayout};
use cachesim_core::config::CacheConfig;

fn static_config() -> CacheConfig {
    CacheConfig {
        read_allocate: true,
        write_allocate: true,
        write_back: true,
        use_pif_attribute: false,
        ..CacheConfig::default()
    }
}

/// With attributes ignored, the booleans come verbatim from configuration
/// and the access is always cacheable.
#[test]
fn static_decode_mirrors_config() {
    let config = static_config();
    let policy = AccessPolicy::decode(&config, &AttributeLayout::default(), None);

    assert!(policy.cacheable);
    assert!(policy.read_allocate);
    assert!(policy.write_allocate);
    assert!(policy.write_back);
}

/// An attribute word is ignored entirely when `use_pif_attribute` is off.
#[test]
fn attribute_word_ignored_when_disabled() {
    let config = static_config();
    // Word with every bit clear would force a bypass if honored.
    let policy = AccessPolicy::decode(&config, &AttributeLayout::default(), Some(0));

    assert!(policy.cacheable, "static mode is always cacheable");
    assert!(policy.write_back);
}

/// Each honored bit maps through the default layout positions.
#[test]
fn pif_bits_decode_individually() {
    let config = CacheConfig {
        use_pif_attribute: true,
        ..CacheConfig::default()
    };
    let layout = AttributeLayout::default();

    // bufferable=bit0, cacheable=bit1, write_back=bit2, read_allocate=bit3,
    // write_allocate=bit4.
    let policy = AccessPolicy::decode(&config, &layout, Some(0b01011));
    assert!(policy.bufferable);
    assert!(policy.cacheable);
    assert!(!policy.write_back);
    assert!(policy.read_allocate);
    assert!(!policy.write_allocate);

    let policy = AccessPolicy::decode(&config, &layout, Some(0b10110));
    assert!(!policy.bufferable);
    assert!(policy.cacheable);
    assert!(policy.write_back);
    assert!(!policy.read_allocate);
    assert!(policy.write_allocate);
}

/// A clear cacheable bit forces a bypass regardless of static policy.
#[test]
fn clear_cacheable_bit_forces_bypass() {
    let config = CacheConfig {
        use_pif_attribute: true,
        read_allocate: true,
        write_allocate: true,
        ..CacheConfig::default()
    };
    let policy = AccessPolicy::decode(&config, &AttributeLayout::default(), Some(0b00001));

    assert!(!policy.cacheable);
}

/// A request without an attribute word falls back to static configuration
/// even when attributes are honored.
#[test]
fn missing_word_falls_back_to_static() {
    let config = CacheConfig {
        use_pif_attribute: true,
        read_allocate: false,
        write_back: true,
        ..CacheConfig::default()
    };
    let policy = AccessPolicy::decode(&config, &AttributeLayout::default(), None);

    assert!(policy.cacheable);
    assert!(!policy.read_allocate);
    assert!(policy.write_back);
}

/// The layout is a value, so test configurations can move the bits.
#[test]
fn custom_layout_moves_bit_positions() {
    let config = CacheConfig {
        use_pif_attribute: true,
        ..CacheConfig::default()
    };
    let layout = AttributeLayout {
        bufferable: 7,
        cacheable: 6,
        write_back: 5,
        read_allocate: 4,
        write_allocate: 3,
    };

    let policy = AccessPolicy::decode(&config, &layout, Some(1 << 6 | 1 << 4));
    assert!(policy.cacheable);
    assert!(policy.read_allocate);
    assert!(!policy.bufferable);
    assert!(!policy.write_back);
    assert!(!policy.write_allocate);
}
