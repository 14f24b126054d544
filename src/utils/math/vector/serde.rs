use num::Float;
use serde::ser::SerializeStruct;
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

use super::SparseVec;

impl<N> Serialize for SparseVec<N>
where
    N: Float + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // fields: dim, inds, vals (inds ascending)
        let mut state = serializer.serialize_struct("SparseVec", 3)?;
        state.serialize_field("dim", &(self.dim as u64))?;
        state.serialize_field("inds", &self.inds)?;
        state.serialize_field("vals", &self.vals)?;
        state.end()
    }
}

impl<'de, N> Deserialize<'de> for SparseVec<N>
where
    N: Float + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct SparseVecData<N> {
            dim: u64,
            inds: Vec<u32>,
            vals: Vec<N>,
        }

        let data = SparseVecData::<N>::deserialize(deserializer)?;
        let vec = SparseVec {
            dim: data.dim as usize,
            inds: data.inds,
            vals: data.vals,
        };
        if !vec.is_well_formed() {
            return Err(D::Error::custom(
                "sparse vector indices must be strictly ascending and inside the dimension",
            ));
        }
        Ok(vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbor_keeps_entries() {
        let v = SparseVec::from_unsorted(8, vec![6, 1], vec![0.25f64, 0.5]);
        let bytes = serde_cbor::to_vec(&v).unwrap();
        let de: SparseVec<f64> = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(de, v);
    }

    #[test]
    fn rejects_unsorted_indices() {
        let bad = r#"{"dim":4,"inds":[2,1],"vals":[1.0,1.0]}"#;
        assert!(serde_json::from_str::<SparseVec<f64>>(bad).is_err());
    }

    #[test]
    fn rejects_index_outside_dimension() {
        let bad = r#"{"dim":2,"inds":[0,5],"vals":[1.0,1.0]}"#;
        assert!(serde_json::from_str::<SparseVec<f64>>(bad).is_err());
    }

    #[test]
    fn rejects_length_mismatch() {
        let bad = r#"{"dim":4,"inds":[0,1],"vals":[1.0]}"#;
        assert!(serde_json::from_str::<SparseVec<f64>>(bad).is_err());
    }
}
