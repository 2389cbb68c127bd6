use std::path::Path;

use serde::Deserialize;

use crate::error::YieldError;
use crate::models::{ComponentVectors, StandInput, StandResult};

/// A stand file holds either one stand or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum StandFile {
    Many(Vec<StandInput>),
    One(StandInput),
}

/// Read stands from a JSON file.
pub fn read_stands(path: impl AsRef<Path>) -> Result<Vec<StandInput>, YieldError> {
    let content = std::fs::read(path.as_ref())?;
    read_stands_from_bytes(&content)
}

/// Read stands from JSON bytes, validating each one.
pub fn read_stands_from_bytes(data: &[u8]) -> Result<Vec<StandInput>, YieldError> {
    let stands = match serde_json::from_slice(data)? {
        StandFile::Many(stands) => stands,
        StandFile::One(stand) => vec![stand],
    };
    for stand in &stands {
        stand.validate()?;
    }
    Ok(stands)
}

/// Read the vectors for a single reconciliation from a JSON file.
pub fn read_component_vectors(path: impl AsRef<Path>) -> Result<ComponentVectors, YieldError> {
    let content = std::fs::read(path.as_ref())?;
    read_component_vectors_from_bytes(&content)
}

pub fn read_component_vectors_from_bytes(data: &[u8]) -> Result<ComponentVectors, YieldError> {
    let vectors: ComponentVectors = serde_json::from_slice(data)?;
    vectors.validate()?;
    Ok(vectors)
}

/// Write stand results to a JSON file.
pub fn write_results_json(
    results: &[StandResult],
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), YieldError> {
    let content = if pretty {
        serde_json::to_string_pretty(results)?
    } else {
        serde_json::to_string(results)?
    };
    std::fs::write(path.as_ref(), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UtilizationSet;

    const STAND: &str = r#"{
        "polygon_id": "01002 S000001 00",
        "bec": "CWH",
        "age_breast_height": 55.0,
        "species": [
            {"genus": "H", "basal_area": 20.0, "trees_per_hectare": 600.0,
             "quad_mean_diameter": 20.6, "lorey_height": 22.0}
        ]
    }"#;

    #[test]
    fn test_single_stand() {
        let stands = read_stands_from_bytes(STAND.as_bytes()).unwrap();
        assert_eq!(stands.len(), 1);
        assert_eq!(stands[0].species[0].genus, "H");
        assert_eq!(stands[0].species[0].whole_stem_volume, None);
    }

    #[test]
    fn test_stand_list() {
        let list = format!("[{STAND}, {STAND}]");
        let stands = read_stands_from_bytes(list.as_bytes()).unwrap();
        assert_eq!(stands.len(), 2);
    }

    #[test]
    fn test_invalid_stand_rejected() {
        let bad = STAND.replace("20.0", "-20.0");
        let err = read_stands_from_bytes(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, YieldError::Validation(_)));
        assert!(read_stands_from_bytes(b"{").is_err());
    }

    #[test]
    fn test_component_vectors() {
        let json = r#"{
            "basal_area": [0, 0.4, 0.1, 0.1, 0.1, 0.1],
            "trees_per_hectare": [0, 5, 1, 1, 1, 2],
            "quad_mean_diameter": [0, 31.5, 10, 15, 20, 46]
        }"#;
        let v = read_component_vectors_from_bytes(json.as_bytes()).unwrap();
        assert_eq!(v.quad_mean_diameter.all(), 31.5);

        let short = r#"{
            "basal_area": [0, 0.4],
            "trees_per_hectare": [0, 5, 1, 1, 1, 2],
            "quad_mean_diameter": [0, 31.5, 10, 15, 20, 46]
        }"#;
        let err = read_component_vectors_from_bytes(short.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("basal_area"));
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let result = StandResult {
            polygon_id: "p1".to_string(),
            bec: "CWH".to_string(),
            layer: UtilizationSet::default(),
            species: vec![],
        };
        write_results_json(&[result.clone()], &path, true).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains('\n'));
        let back: Vec<StandResult> = serde_json::from_str(&content).unwrap();
        assert_eq!(back, vec![result]);
    }
}
