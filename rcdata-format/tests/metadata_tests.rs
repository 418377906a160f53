use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rcdata_format::{
    ContentType, FORMAT_VERSION, FormatError, KeyRef, MicroCodeHeader, PipelineConfig,
    PipelineMetadata, decode_preamble, encode_preamble,
};

fn roundtrip(metadata: &PipelineMetadata) -> PipelineMetadata {
    let (header, record) = metadata.to_header_fields();
    let decoded = MicroCodeHeader::decode(&[&header.encode()[..], &record[..]].concat()).unwrap();
    PipelineMetadata::from_header_and_trailer(&decoded, &record).unwrap()
}

// =============================================================================
// from_configuration
// =============================================================================

#[test]
fn plain_configuration() {
    let m =
        PipelineMetadata::from_configuration(&PipelineConfig::new(ContentType::Generic)).unwrap();
    assert_eq!(m, PipelineMetadata::plain(ContentType::Generic));
    assert_eq!(m.version(), FORMAT_VERSION);
}

#[test]
fn flag_without_algorithm_is_config_error() {
    let config = PipelineConfig {
        compact: true,
        ..PipelineConfig::default()
    };
    let err = PipelineMetadata::from_configuration(&config).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn algorithm_without_flag_is_config_error() {
    let config = PipelineConfig {
        hash_algorithm: Some("sha256".into()),
        ..PipelineConfig::default()
    };
    assert!(PipelineMetadata::from_configuration(&config).unwrap_err().is_config());
}

#[test]
fn key_ref_without_encrypt_is_config_error() {
    let config = PipelineConfig {
        key_ref: Some(KeyRef::new("k1")),
        ..PipelineConfig::default()
    };
    assert!(PipelineMetadata::from_configuration(&config).unwrap_err().is_config());
}

#[test]
fn empty_and_non_ascii_names_rejected() {
    let empty = PipelineConfig::new(ContentType::Generic).compact("");
    assert!(PipelineMetadata::from_configuration(&empty).is_err());
    let spaced = PipelineConfig::new(ContentType::Generic).hash("sha 256");
    assert!(PipelineMetadata::from_configuration(&spaced).is_err());
    let unicode = PipelineConfig::new(ContentType::Generic).hash("shä256");
    assert!(PipelineMetadata::from_configuration(&unicode).is_err());
}

#[test]
fn prime_wider_than_three_bits_rejected() {
    let config = PipelineConfig::new(ContentType::Generic).prime(8);
    assert!(PipelineMetadata::from_configuration(&config).unwrap_err().is_config());
}

#[test]
fn names_exceeding_expansion_budget_rejected() {
    let long = "x".repeat(60);
    let config = PipelineConfig::new(ContentType::Generic).compact(&long);
    let err = PipelineMetadata::from_configuration(&config).unwrap_err();
    assert!(err.to_string().contains("expansion bytes"));
}

#[test]
fn configuration_deserializes_with_defaults() {
    let config: PipelineConfig = serde_json::from_str(
        r#"{"content_type": "resource", "hash": true, "hash_algorithm": "sha512"}"#,
    )
    .unwrap();
    let m = PipelineMetadata::from_configuration(&config).unwrap();
    assert_eq!(m.content_type(), ContentType::Resource);
    assert_eq!(m.hash_algorithm(), Some("sha512"));
    assert!(m.compact_algorithm().is_none());
    assert_eq!(m.to_configuration(), config);
}

// =============================================================================
// header fields
// =============================================================================

#[test]
fn header_bits_follow_metadata() {
    let config = PipelineConfig::new(ContentType::ResourceIndex)
        .compact("zstd")
        .hash("sha256")
        .prime(5);
    let m = PipelineMetadata::from_configuration(&config).unwrap();
    let (header, record) = m.to_header_fields();
    assert_eq!(header.identifier(), 0x2);
    assert!(header.is_compact());
    assert!(!header.is_encrypt());
    assert!(header.is_hash());
    assert_eq!(header.prime(), 5);
    assert_eq!(header.expand_len(), record.len());
    assert_eq!(&record[..4], &[FORMAT_VERSION, 0x00, 0x01, 0x01]);
}

#[test]
fn full_pipeline_roundtrip() {
    let config = PipelineConfig::new(ContentType::Resource)
        .compact("zstd")
        .encrypt("ed25519", Some(KeyRef::new("release-2024")))
        .hash("sha384");
    let m = PipelineMetadata::from_configuration(&config).unwrap();
    assert_eq!(roundtrip(&m), m);
}

#[test]
fn encrypt_without_key_ref_roundtrip() {
    let config = PipelineConfig::new(ContentType::Generic).encrypt("ed25519", None);
    let m = PipelineMetadata::from_configuration(&config).unwrap();
    let back = roundtrip(&m);
    assert_eq!(back.encrypt().unwrap().key_ref, None);
    assert_eq!(back, m);
}

#[test]
fn preamble_roundtrip_leaves_payload() {
    let config = PipelineConfig::new(ContentType::Generic).hash("sha256");
    let m = PipelineMetadata::from_configuration(&config).unwrap();
    let mut file = encode_preamble(&m);
    file.extend_from_slice(b"{}");
    let (decoded, payload) = decode_preamble(&file).unwrap();
    assert_eq!(decoded, m);
    assert_eq!(payload, b"{}");
}

// =============================================================================
// trailer failures
// =============================================================================

#[test]
fn unknown_version_rejected() {
    let m = PipelineMetadata::plain(ContentType::Generic);
    let (header, mut record) = m.to_header_fields();
    record[0] = FORMAT_VERSION + 1;
    assert_eq!(
        PipelineMetadata::from_header_and_trailer(&header, &record).unwrap_err(),
        FormatError::UnsupportedVersion {
            found: FORMAT_VERSION + 1,
            supported: FORMAT_VERSION
        }
    );
}

#[test]
fn tag_disagreeing_with_identifier_rejected() {
    let m = PipelineMetadata::plain(ContentType::Generic);
    let (header, mut record) = m.to_header_fields();
    record[1..4].copy_from_slice(&ContentType::Resource.tag());
    assert!(matches!(
        PipelineMetadata::from_header_and_trailer(&header, &record),
        Err(FormatError::ContentTypeMismatch { .. })
    ));
}

#[test]
fn unknown_tag_rejected() {
    let m = PipelineMetadata::plain(ContentType::Generic);
    let (header, mut record) = m.to_header_fields();
    record[1..4].copy_from_slice(&[0xff, 0xff, 0xff]);
    assert!(matches!(
        PipelineMetadata::from_header_and_trailer(&header, &record),
        Err(FormatError::UnknownContentType(_))
    ));
}

#[test]
fn truncated_name_rejected() {
    let config = PipelineConfig::new(ContentType::Generic).compact("zstd");
    let m = PipelineMetadata::from_configuration(&config).unwrap();
    let (_, record) = m.to_header_fields();
    let short = &record[..record.len() - 1];
    let header = MicroCodeHeader::new(0, true, false, 0, false, short.len() as u8).unwrap();
    assert!(matches!(
        PipelineMetadata::from_header_and_trailer(&header, short),
        Err(FormatError::Malformed(_))
    ));
}

#[test]
fn trailing_garbage_rejected() {
    let m = PipelineMetadata::plain(ContentType::Generic);
    let (_, mut record) = m.to_header_fields();
    record.push(0);
    let header = MicroCodeHeader::new(0, false, false, 0, false, record.len() as u8).unwrap();
    assert!(matches!(
        PipelineMetadata::from_header_and_trailer(&header, &record),
        Err(FormatError::Malformed(_))
    ));
}

#[test]
fn preamble_shorter_than_header() {
    assert!(matches!(decode_preamble(&[0x00]), Err(FormatError::Truncated { .. })));
}

// =============================================================================
// PROPERTIES
// =============================================================================

fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[!-~]{1,10}").unwrap()
}

fn config_strategy() -> impl Strategy<Value = PipelineConfig> {
    (
        prop::sample::select(ContentType::ALL.to_vec()),
        prop::option::of(name_strategy()),
        prop::option::of((name_strategy(), prop::option::of(name_strategy()))),
        prop::option::of(name_strategy()),
        0u8..8,
    )
        .prop_map(|(content_type, compact, encrypt, hash, prime)| {
            let mut config = PipelineConfig::new(content_type).prime(prime);
            if let Some(name) = compact {
                config = config.compact(&name);
            }
            if let Some((name, key)) = encrypt {
                config = config.encrypt(&name, key.map(KeyRef::new));
            }
            if let Some(name) = hash {
                config = config.hash(&name);
            }
            config
        })
}

proptest! {
    /// Every legal metadata value survives the header + trailer encoding.
    #[test]
    fn metadata_roundtrip(config in config_strategy()) {
        let m = PipelineMetadata::from_configuration(&config).unwrap();
        prop_assert_eq!(roundtrip(&m), m);
    }
}
