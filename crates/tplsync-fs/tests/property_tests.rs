use proptest::prelude::*;
use tplsync_fs::digest::{DigestAlgorithm, DigestError, verify_checksum};
use tplsync_fs::{NormalizedPath, clean};

fn algorithms() -> impl Strategy<Value = DigestAlgorithm> {
    prop_oneof![
        Just(DigestAlgorithm::Blake3),
        Just(DigestAlgorithm::Sha256),
        Just(DigestAlgorithm::Md5),
    ]
}

fn flip_hex(c: char) -> char {
    if c == '0' { '1' } else { '0' }
}

proptest! {
    #[test]
    fn test_digest_round_trip(content in proptest::collection::vec(any::<u8>(), 0..512), algo in algorithms()) {
        let spec = format!("{}:{}", algo, algo.hex_digest(&content));
        prop_assert!(verify_checksum(&content, &spec).is_ok());

        // Uppercase spec verifies too
        prop_assert!(verify_checksum(&content, &spec.to_uppercase()).is_ok());
    }

    #[test]
    fn test_flipped_digest_mismatches(
        content in proptest::collection::vec(any::<u8>(), 0..256),
        algo in algorithms(),
        position in any::<prop::sample::Index>(),
    ) {
        let mut digest: Vec<char> = algo.hex_digest(&content).chars().collect();
        let idx = position.index(digest.len());
        digest[idx] = flip_hex(digest[idx]);
        let spec = format!("{}:{}", algo, digest.into_iter().collect::<String>());

        let is_mismatch = matches!(
            verify_checksum(&content, &spec),
            Err(DigestError::Mismatch { .. })
        );
        prop_assert!(is_mismatch);
    }

    #[test]
    fn test_clean_is_idempotent(s in "[a-z./]{0,40}") {
        let once = clean(&s);
        prop_assert_eq!(clean(&once), once.clone());
        prop_assert!(!once.contains("//"));
    }

    #[test]
    fn test_normalized_path_has_no_backslashes(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));
    }
}
