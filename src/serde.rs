//! Serde support for `CardinalityEstimator`, behind the `with_serde` feature.
//!
//! Estimators serialize as the binary codec's byte blob, so every serde
//! format carries exactly the versioned payload [`CardinalityEstimator::to_bytes`]
//! produces and deserialization performs the same validation as
//! [`CardinalityEstimator::from_bytes`].

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{Error as DeError, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::estimator::CardinalityEstimator;

impl<T: Hash + ?Sized, H: Hasher + Default> Serialize for CardinalityEstimator<T, H> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de, T: Hash + ?Sized, H: Hasher + Default> Deserialize<'de> for CardinalityEstimator<T, H> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("estimator bytes")
            }

            fn visit_bytes<E: DeError>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(v.to_vec())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                Ok(bytes)
            }
        }

        let bytes = deserializer.deserialize_bytes(BytesVisitor)?;
        Self::from_bytes(&bytes).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0; "empty estimator")]
    #[test_case(1; "single element")]
    #[test_case(100; "hundred distinct elements")]
    #[test_case(10_000; "ten thousand distinct elements")]
    fn round_trips_through_serde_json(n: usize) {
        let mut original = CardinalityEstimator::<str>::new(12).unwrap();
        for i in 0..n {
            original.insert(&format!("item{i}"));
        }

        let serialized = serde_json::to_string(&original).expect("serialization failed");
        let deserialized: CardinalityEstimator<str> =
            serde_json::from_str(&serialized).expect("deserialization failed");

        assert_eq!(deserialized, original);
        assert_eq!(deserialized.estimate(), original.estimate());
    }

    #[test]
    fn rejects_invalid_json() {
        let result: Result<CardinalityEstimator<str>, _> =
            serde_json::from_str("{ invalid_json_string }");
        assert!(result.is_err());
    }

    #[test_case("[9,12,6,1]"; "unknown format version")]
    #[test_case("[1,3,6,1]"; "bucket_bits below range")]
    #[test_case("[1,12,6,1]"; "missing payload")]
    #[test_case("[]"; "no header")]
    fn rejects_malformed_payloads(input: &str) {
        let result: Result<CardinalityEstimator<str>, _> = serde_json::from_str(input);
        assert!(result.is_err());
    }
}
