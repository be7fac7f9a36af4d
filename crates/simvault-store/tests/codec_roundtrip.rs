use simvault_core::VaultError;
use simvault_store::{ArrayData, ArtifactArray, ArtifactSet, CodecRegistry};
use tempfile::tempdir;

fn mixed_set() -> ArtifactSet {
    let mut arrays = ArtifactSet::new();
    arrays.insert(
        "energy".to_string(),
        ArtifactArray::from_f64(vec![1.5, -2.25, 0.0, f64::MIN_POSITIVE]),
    );
    arrays.insert(
        "grid".to_string(),
        ArtifactArray::new(vec![2, 3], ArrayData::F32(vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0]))
            .unwrap(),
    );
    arrays.insert(
        "counts".to_string(),
        ArtifactArray::new(vec![3], ArrayData::I32(vec![-1, 0, i32::MAX])).unwrap(),
    );
    arrays.insert(
        "steps".to_string(),
        ArtifactArray::from_i64(vec![i64::MIN, 0, i64::MAX]),
    );
    arrays.insert(
        "mask".to_string(),
        ArtifactArray::new(vec![4], ArrayData::Bool(vec![true, false, false, true])).unwrap(),
    );
    arrays.insert(
        "bytes".to_string(),
        ArtifactArray::new(vec![2, 2], ArrayData::U8(vec![0, 127, 128, 255])).unwrap(),
    );
    arrays.insert(
        "empty".to_string(),
        ArtifactArray::new(vec![0], ArrayData::F64(vec![])).unwrap(),
    );
    arrays.insert(
        "scalar".to_string(),
        ArtifactArray::new(vec![], ArrayData::F64(vec![42.0])).unwrap(),
    );
    arrays
}

fn roundtrip(format: &str, arrays: &ArtifactSet) -> ArtifactSet {
    let registry = CodecRegistry::with_available();
    let codec = registry.get(format).expect("codec");
    let dir = tempdir().expect("tempdir");
    let written = codec.write(arrays, dir.path()).expect("write");
    codec.read(&written).expect("read")
}

#[test]
fn npz_round_trips_mixed_dtypes() {
    let arrays = mixed_set();
    assert_eq!(roundtrip("npz", &arrays), arrays);
}

#[test]
fn zarr_round_trips_mixed_dtypes() {
    let arrays = mixed_set();
    assert_eq!(roundtrip("zarr", &arrays), arrays);
}

#[cfg(feature = "hdf5")]
#[test]
fn hdf5_round_trips_mixed_dtypes() {
    let arrays = mixed_set();
    assert_eq!(roundtrip("hdf5", &arrays), arrays);
}

#[test]
fn empty_set_round_trips_everywhere() {
    let arrays = ArtifactSet::new();
    let registry = CodecRegistry::with_available();
    for format in registry.formats() {
        assert_eq!(roundtrip(format, &arrays), arrays, "format {format}");
    }
}

#[test]
fn single_array_round_trips_everywhere() {
    let mut arrays = ArtifactSet::new();
    arrays.insert("only".to_string(), ArtifactArray::from_f64(vec![3.25]));
    let registry = CodecRegistry::with_available();
    for format in registry.formats() {
        assert_eq!(roundtrip(format, &arrays), arrays, "format {format}");
    }
}

#[test]
fn rewrite_replaces_previous_content() {
    let registry = CodecRegistry::with_available();
    let dir = tempdir().expect("tempdir");
    for format in ["npz", "zarr"] {
        let codec = registry.get(format).expect("codec");
        let first = mixed_set();
        codec.write(&first, dir.path()).expect("first write");
        let mut second = ArtifactSet::new();
        second.insert("fresh".to_string(), ArtifactArray::from_i64(vec![9]));
        let written = codec.write(&second, dir.path()).expect("second write");
        assert_eq!(codec.read(&written).expect("read"), second, "format {format}");
    }
}

#[test]
fn unknown_format_is_a_config_error() {
    let registry = CodecRegistry::with_available();
    let err = registry.get("parquet").unwrap_err();
    assert!(matches!(err, VaultError::Config(_)));
}

#[cfg(not(feature = "hdf5"))]
#[test]
fn recognized_but_uncompiled_format_is_unavailable() {
    assert!(simvault_store::KNOWN_FORMATS.contains(&"hdf5"));
    let registry = CodecRegistry::with_available();
    let err = registry.get("hdf5").unwrap_err();
    assert!(matches!(err, VaultError::Unavailable(_)));
}
