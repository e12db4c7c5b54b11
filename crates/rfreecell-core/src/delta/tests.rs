use std::collections::{HashMap, VecDeque};

use super::{DeltaCodec, ENCODED_LEN, EncodedKey};
use crate::movegen::expand;
use crate::position::Position;
use crate::types::Variant;

// Microsoft FreeCell 配布 #1
const MS_DEAL_1: &str = "\
: JD KD 2S 4C 3S 6D 6S
: 2D KC KS 5C TD 8S 9C
: 9H 9S 9D TS 4S 8D 2H
: JC 5S QD QH TH QS 6H
: 5D AD JS 4H 8H 6C
: 7H QC AS AC 2C 3D
: 7C KH AH 4D JH 8C
: 5H 3H 3C 7S 7D TC
";

#[test]
fn test_roundtrip_baseline() {
    let pos = Position::from_deal_text(MS_DEAL_1, Variant::Freecell).unwrap();
    let codec = DeltaCodec::new(&pos);
    let key = codec.encode(&pos);
    assert_eq!(codec.decode(&key), pos);
}

#[test]
fn test_roundtrip_and_injectivity_along_walk() {
    let root = Position::from_deal_text(MS_DEAL_1, Variant::Freecell).unwrap();
    let codec = DeltaCodec::new(&root);

    // 幅優先で数百局面をたどり、各局面で往復一致と鍵の単射性を確かめる
    let mut seen: HashMap<EncodedKey, Position> = HashMap::new();
    let mut queue: VecDeque<Position> = VecDeque::new();
    seen.insert(codec.encode(&root), root.clone());
    queue.push_back(root);

    let mut out = Vec::new();
    while let Some(pos) = queue.pop_front() {
        if seen.len() >= 300 {
            break;
        }
        expand(&pos, &mut out);
        for derived in &out {
            let key = codec.encode(&derived.position);
            assert_eq!(
                codec.decode(&key),
                derived.position,
                "decode must invert encode"
            );
            match seen.get(&key) {
                Some(prev) => assert_eq!(prev, &derived.position, "key collision"),
                None => {
                    seen.insert(key, derived.position.clone());
                    queue.push_back(derived.position.clone());
                }
            }
        }
    }
    assert!(seen.len() >= 300);
}

#[test]
fn test_keys_are_fixed_width_and_ordered_bytewise() {
    let pos = Position::from_deal_text(MS_DEAL_1, Variant::Freecell).unwrap();
    let codec = DeltaCodec::new(&pos);
    let key = codec.encode(&pos);
    assert_eq!(key.as_bytes().len(), ENCODED_LEN);
    assert_eq!(EncodedKey::from_bytes(key.as_bytes()), Some(key));
    assert_eq!(EncodedKey::from_bytes(&[0u8; 3]), None);

    let a = EncodedKey::from_bytes(&[0u8; ENCODED_LEN]).unwrap();
    let b = EncodedKey::from_bytes(&[1u8; ENCODED_LEN]).unwrap();
    assert!(a < b);
}

#[test]
fn test_roundtrip_bakers_dozen() {
    let text = "\
Foundations: C-0 D-K H-K S-K
: 2C AC
: 3C KC
: 4C 5C 6C 7C 8C 9C TC JC QC
";
    let root = Position::from_deal_text(text, Variant::BakersDozen).unwrap();
    let codec = DeltaCodec::new(&root);
    assert_eq!(codec.decode(&codec.encode(&root)), root);

    let mut out = Vec::new();
    expand(&root, &mut out);
    assert!(!out.is_empty());
    for derived in &out {
        let key = codec.encode(&derived.position);
        assert_eq!(codec.decode(&key), derived.position);
    }
}
